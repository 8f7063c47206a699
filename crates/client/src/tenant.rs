use std::fmt;

/// Tenant id used when none is configured. It also selects the school-curriculum terminology.
pub const DEFAULT_TENANT: &str = "default";

/// A customer partition. Changes both request headers and what things are called.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tenant(String);

/// User-facing names for things, which depend on the tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Terminology {
    pub course: &'static str,
    pub courses: &'static str,
    pub module: &'static str,
    pub modules: &'static str,
}

impl Tenant {
    pub fn new(id: &str) -> Self {
        if id.trim().is_empty() {
            Self(DEFAULT_TENANT.to_string())
        } else {
            Self(id.trim().to_string())
        }
    }

    pub fn id(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_TENANT
    }

    pub fn terminology(&self) -> Terminology {
        if self.is_default() {
            Terminology {
                course: "Subject",
                courses: "Subjects",
                module: "Chapter",
                modules: "Chapters",
            }
        } else {
            Terminology {
                course: "Course",
                courses: "Courses",
                module: "Module",
                modules: "Modules",
            }
        }
    }

    /// Whether board / grade / medium chips are shown
    pub fn shows_curriculum(&self) -> bool {
        self.is_default()
    }

    /// Pick between a school-style and a generic field, falling back to whichever is present.
    pub(crate) fn pick_name(&self, school: Option<&str>, generic: Option<&str>) -> String {
        fn non_empty(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }

        let (first, second) = if self.is_default() {
            (school, generic)
        } else {
            (generic, school)
        };

        non_empty(first)
            .or_else(|| non_empty(second))
            .unwrap_or("Untitled")
            .to_string()
    }
}

impl Default for Tenant {
    fn default() -> Self {
        Self(DEFAULT_TENANT.to_string())
    }
}

impl fmt::Display for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tenant_is_default() {
        assert!(Tenant::new("").is_default());
        assert!(Tenant::new("  ").is_default());
        assert!(!Tenant::new("acme").is_default());
    }

    #[test]
    fn terminology_follows_tenant() {
        assert_eq!(Tenant::default().terminology().modules, "Chapters");
        assert_eq!(Tenant::new("acme").terminology().courses, "Courses");
        assert!(!Tenant::new("acme").shows_curriculum());
    }

    #[test]
    fn names_prefer_tenant_field_then_fall_back() {
        let school = Tenant::default();
        let acme = Tenant::new("acme");

        assert_eq!(school.pick_name(Some("Ch 1"), Some("Intro")), "Ch 1");
        assert_eq!(acme.pick_name(Some("Ch 1"), Some("Intro")), "Intro");
        assert_eq!(acme.pick_name(Some("Ch 1"), Some(" ")), "Ch 1");
        assert_eq!(school.pick_name(None, None), "Untitled");
    }
}
