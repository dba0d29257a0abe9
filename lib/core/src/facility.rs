use crate::school::SchoolRecord;

/// Facility categories that have a dedicated boolean on the school record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facility {
    Library,
    ComputerLab,
    Sports,
    SwimmingPool,
    Hostel,
    Transport,
    Cafeteria,
    Auditorium,
}

impl Facility {
    pub const ALL: [Facility; 8] = [
        Facility::Library,
        Facility::ComputerLab,
        Facility::Sports,
        Facility::SwimmingPool,
        Facility::Hostel,
        Facility::Transport,
        Facility::Cafeteria,
        Facility::Auditorium,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Facility::Library => "library",
            Facility::ComputerLab => "computer lab",
            Facility::Sports => "sports",
            Facility::SwimmingPool => "swimming pool",
            Facility::Hostel => "hostel",
            Facility::Transport => "transport",
            Facility::Cafeteria => "cafeteria",
            Facility::Auditorium => "auditorium",
        }
    }

    /// Canonical lookup. Case-insensitive, whole name only.
    pub fn from_name(name: &str) -> Option<Facility> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    /// Whether the record's flag for this facility is set.
    pub fn is_flagged(self, school: &SchoolRecord) -> bool {
        let flag = match self {
            Facility::Library => school.has_library,
            Facility::ComputerLab => school.has_computer_lab,
            Facility::Sports => {
                return school.has_playground == Some(true) || school.sports_facilities.is_some();
            }
            Facility::SwimmingPool => school.has_swimming_pool,
            Facility::Hostel => school.has_hostel,
            Facility::Transport => school.has_transport,
            Facility::Cafeteria => school.has_cafeteria,
            Facility::Auditorium => school.has_auditorium,
        };
        flag == Some(true)
    }
}

/// Whether `school` offers the facility called `requested`.
///
/// Passes when any free-form entry contains the request or is contained in
/// it (case-insensitive), or when the canonical flag for the request is set.
/// Unknown names with no free-form list never pass.
pub fn offers(school: &SchoolRecord, requested: &str) -> bool {
    let wanted = requested.trim().to_lowercase();
    if wanted.is_empty() {
        return true;
    }

    let listed = school.facilities.as_deref().unwrap_or_default().iter().any(|entry| {
        let entry = entry.trim().to_lowercase();
        !entry.is_empty() && (entry.contains(&wanted) || wanted.contains(&entry))
    });

    listed || Facility::from_name(&wanted).is_some_and(|f| f.is_flagged(school))
}

/// AND across all requested names.
pub fn offers_all<S: AsRef<str>>(school: &SchoolRecord, requested: &[S]) -> bool {
    requested.iter().all(|name| offers(school, name.as_ref()))
}
