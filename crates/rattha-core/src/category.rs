//! The closed set of eighteen constitutional categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category a section belongs to. Fixed configuration, never derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Preamble,
    General,
    Monarchy,
    RightsDuties,
    StatePolicies,
    Reform,
    Legislative,
    Executive,
    Judicial,
    ConflictInterest,
    IndependentOrgs,
    ConstCourt,
    Ethics,
    LocalAdmin,
    Amendment,
    CoupPower,
    FinalProvisions,
    Transitory,
}

impl Category {
    /// All categories in report order.
    pub const ALL: [Category; 18] = [
        Self::Preamble,
        Self::General,
        Self::Monarchy,
        Self::RightsDuties,
        Self::StatePolicies,
        Self::Reform,
        Self::Legislative,
        Self::Executive,
        Self::Judicial,
        Self::ConflictInterest,
        Self::IndependentOrgs,
        Self::ConstCourt,
        Self::Ethics,
        Self::LocalAdmin,
        Self::Amendment,
        Self::CoupPower,
        Self::FinalProvisions,
        Self::Transitory,
    ];

    /// Fallback for anything the mapper leaves unmapped or maps outside the set.
    pub const DEFAULT: Category = Self::General;

    pub fn id(&self) -> &'static str {
        match self {
            Self::Preamble => "preamble",
            Self::General => "general",
            Self::Monarchy => "monarchy",
            Self::RightsDuties => "rights_duties",
            Self::StatePolicies => "state_policies",
            Self::Reform => "reform",
            Self::Legislative => "legislative",
            Self::Executive => "executive",
            Self::Judicial => "judicial",
            Self::ConflictInterest => "conflict_interest",
            Self::IndependentOrgs => "independent_orgs",
            Self::ConstCourt => "const_court",
            Self::Ethics => "ethics",
            Self::LocalAdmin => "local_admin",
            Self::Amendment => "amendment",
            Self::CoupPower => "coup_power",
            Self::FinalProvisions => "final_provisions",
            Self::Transitory => "transitory",
        }
    }

    /// Thai display name, with scope hints used in prompts.
    pub fn thai_name(&self) -> &'static str {
        match self {
            Self::Preamble => "คำปรารภ",
            Self::General => "บททั่วไป (เอกราช, อาณาเขต, ศาสนา)",
            Self::Monarchy => "พระมหากษัตริย์/องคมนตรี",
            Self::RightsDuties => "สิทธิเสรีภาพและหน้าที่ของคนไทย",
            Self::StatePolicies => "หน้าที่/แนวนโยบายของรัฐ",
            Self::Reform => "การปฏิรูปประเทศ",
            Self::Legislative => "อำนาจนิติบัญญัติ (ส.ส., ส.ว., การเลือกตั้ง)",
            Self::Executive => "อำนาจบริหาร (ครม., นายกฯ)",
            Self::Judicial => "อำนาจตุลาการ (ศาลยุติธรรม, ศาลปกครอง, ศาลทหาร)",
            Self::ConflictInterest => "การขัดกันของผลประโยชน์",
            Self::IndependentOrgs => "องค์กรอิสระ (กกต., ป.ป.ช., สตง.)",
            Self::ConstCourt => "ตุลาการ/ศาลรัฐธรรมนูญ",
            Self::Ethics => "จริยธรรมของผู้ดำรงตำแหน่ง",
            Self::LocalAdmin => "การปกครองส่วนท้องถิ่น",
            Self::Amendment => "การแก้ไขเพิ่มเติมรัฐธรรมนูญ",
            Self::CoupPower => "อำนาจคณะรัฐประหาร (นิรโทษกรรม, ม.17, ม.44)",
            Self::FinalProvisions => "บทสุดท้าย",
            Self::Transitory => "บทเฉพาะกาล",
        }
    }

    /// Exact id lookup.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id.trim())
    }

    /// Lookup with the `general` fallback.
    pub fn from_id_or_default(id: &str) -> Self {
        Self::from_id(id).unwrap_or(Self::DEFAULT)
    }

    /// `- id: name` lines for prompts.
    pub fn prompt_listing() -> String {
        Self::ALL
            .iter()
            .map(|c| format!("- {}: {}", c.id(), c.thai_name()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}
