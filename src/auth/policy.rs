// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Declarative access rules for the API namespace.
//!
//! Rules are checked in order and the first matching pattern wins. Requests
//! outside the namespace are not governed by the policy at all.

/// Authentication state a route requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
}

/// Outcome of evaluating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Path is outside the namespace; the policy does not apply.
    Bypass,
    Permit,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`: exactly one segment
    Any,
    /// `**`: zero or more segments
    Rest,
}

/// Path pattern with `*` and `**` wildcards, e.g. `/api/*/users/join`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split(pattern)
            .map(|s| match s {
                "*" => Segment::Any,
                "**" => Segment::Rest,
                literal => Segment::Literal(literal.to_string()),
            })
            .collect();
        Self { segments }
    }

    pub fn matches(&self, path: &str) -> bool {
        let parts: Vec<&str> = split(path).collect();
        matches_from(&self.segments, &parts)
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn matches_from(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::Rest, rest)) => (0..=path.len()).any(|skip| matches_from(rest, &path[skip..])),
        Some((segment, rest)) => match path.split_first() {
            None => false,
            Some((head, tail)) => {
                let head_ok = match segment {
                    Segment::Literal(literal) => literal == head,
                    _ => true,
                };
                head_ok && matches_from(rest, tail)
            }
        },
    }
}

/// Ordered access rules over one path namespace.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    namespace: String,
    rules: Vec<(RoutePattern, Access)>,
    fallback: Access,
}

impl AccessPolicy {
    /// Policy governing paths that start with `namespace`. Unmatched paths
    /// inside it require authentication.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            rules: Vec::new(),
            fallback: Access::Authenticated,
        }
    }

    pub fn rule(mut self, pattern: &str, access: Access) -> Self {
        self.rules.push((RoutePattern::parse(pattern), access));
        self
    }

    /// Registration and login are public; everything else under `/api/`
    /// needs an identity.
    pub fn standard() -> Self {
        Self::new("/api/")
            .rule("/api/*/users/join", Access::Public)
            .rule("/api/*/users/login", Access::Public)
            .rule("/api/**", Access::Authenticated)
    }

    pub fn applies_to(&self, path: &str) -> bool {
        path.starts_with(&self.namespace)
    }

    /// Access required for `path`, or `None` outside the namespace.
    pub fn required(&self, path: &str) -> Option<Access> {
        if !self.applies_to(path) {
            return None;
        }
        let access = self
            .rules
            .iter()
            .find(|(pattern, _)| pattern.matches(path))
            .map(|(_, access)| *access)
            .unwrap_or(self.fallback);
        Some(access)
    }

    pub fn evaluate(&self, path: &str, authenticated: bool) -> Decision {
        match self.required(path) {
            None => Decision::Bypass,
            Some(Access::Public) => Decision::Permit,
            Some(Access::Authenticated) if authenticated => Decision::Permit,
            Some(Access::Authenticated) => Decision::Deny,
        }
    }
}
