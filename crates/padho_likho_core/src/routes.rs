//! crates/padho_likho_core/src/routes.rs
//!
//! The portal's path table: which screens exist and who may see them.

use crate::domain::Role;

/// Who may render a screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    /// Any signed-in viewer, whatever the role.
    Authenticated,
    Roles(Vec<Role>),
}

impl RouteAccess {
    pub fn permits(&self, role: Role) -> bool {
        match self {
            RouteAccess::Public | RouteAccess::Authenticated => true,
            RouteAccess::Roles(roles) => roles.contains(&role),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub pattern: String,
    pub access: RouteAccess,
}

impl RouteRule {
    pub fn new(pattern: &str, access: RouteAccess) -> Self {
        Self {
            pattern: pattern.to_string(),
            access,
        }
    }

    /// `:name` matches one non-empty segment, a trailing `*` matches the rest.
    pub fn matches(&self, path: &str) -> bool {
        let wanted = segments(&self.pattern);
        let actual = segments(path);

        let mut actual_iter = actual.iter();
        for (i, pattern_segment) in wanted.iter().enumerate() {
            if *pattern_segment == "*" && i == wanted.len() - 1 {
                return true;
            }
            match actual_iter.next() {
                Some(segment) if pattern_segment.starts_with(':') => {
                    if segment.is_empty() {
                        return false;
                    }
                }
                Some(segment) if segment == pattern_segment => {}
                _ => return false,
            }
        }
        actual_iter.next().is_none()
    }
}

fn segments(path: &str) -> Vec<&str> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// First matching rule wins.
#[derive(Debug, Clone)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    pub fn rule_for(&self, path: &str) -> Option<&RouteRule> {
        self.rules.iter().find(|rule| rule.matches(path))
    }

    /// Unknown paths are public so the router can show its not-found screen.
    pub fn access_for(&self, path: &str) -> RouteAccess {
        self.rule_for(path)
            .map(|rule| rule.access.clone())
            .unwrap_or(RouteAccess::Public)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        use RouteAccess::{Authenticated, Public, Roles};

        let rules = vec![
            RouteRule::new("/", Public),
            RouteRule::new("/login", Public),
            RouteRule::new("/register", Public),
            RouteRule::new("/forgot-password", Public),
            RouteRule::new("/reset-password/:token", Public),
            RouteRule::new("/teachers", Public),
            RouteRule::new("/teachers/:id", Public),
            RouteRule::new("/student/*", Roles(vec![Role::Student])),
            RouteRule::new("/teacher/*", Roles(vec![Role::Teacher])),
            RouteRule::new("/parent/*", Roles(vec![Role::Parent])),
            RouteRule::new("/book/:teacherId", Roles(vec![Role::Student, Role::Parent])),
            RouteRule::new("/classroom/:id", Authenticated),
            RouteRule::new("/bookings/:id", Authenticated),
            RouteRule::new("/assessments/:id", Authenticated),
            RouteRule::new("/assessments/:id/take", Authenticated),
            RouteRule::new("/profile", Authenticated),
        ];
        Self::new(rules)
    }
}
