// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Offset pagination shared by every list endpoint.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Page size used when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Upper bound on a single page.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Zero-based page selection, read from `?page=&size=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageRequest {
    /// Zero-based page index.
    #[serde(default)]
    pub page: u32,
    /// Requested page size (clamped to 1..=100).
    #[serde(default = "default_size")]
    pub size: u32,
}

fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }

    /// Effective page size after clamping.
    pub fn limit(&self) -> usize {
        self.size.clamp(1, MAX_PAGE_SIZE) as usize
    }

    /// Number of visible items to skip.
    pub fn offset(&self) -> usize {
        (self.page as usize).saturating_mul(self.limit())
    }
}

/// One page of results plus the totals needed to render pagers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: u64) -> Self {
        let size = request.limit() as u64;
        Self {
            content,
            page: request.page,
            size: size as u32,
            total_elements,
            total_pages: total_elements.div_ceil(size),
        }
    }

    /// Convert the page content, keeping the totals.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }

    /// Fallible variant of [`Page::map`].
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            content: self.content.into_iter().map(f).collect::<Result<_, _>>()?,
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        })
    }
}
