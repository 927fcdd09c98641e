use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{DrawListQuery, DrawResponse};

const DEFAULT_PER_PAGE: u64 = 20;
const MAX_PER_PAGE: u64 = 100;

/// 归一化后的分页参数（页码从 1 开始，每页 1..=100）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub per_page: u64,
}

impl PageWindow {
    pub fn new(page: Option<u32>, per_page: Option<u32>) -> Self {
        Self {
            page: page.map_or(1, u64::from).max(1),
            per_page: per_page
                .map_or(DEFAULT_PER_PAGE, u64::from)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }
}

impl From<&DrawListQuery> for PageWindow {
    fn from(query: &DrawListQuery) -> Self {
        PageWindow::new(query.page, query.per_page)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginationInfo {
    pub current_page: u64,
    pub per_page: u64,
    pub total: i64,
    /// 无数据时为 1
    pub total_pages: u64,
    pub has_next: bool,
}

impl PaginationInfo {
    pub fn new(window: PageWindow, total: i64) -> Self {
        let total_items = total.max(0) as u64;
        let total_pages = total_items.div_ceil(window.per_page).max(1);

        Self {
            current_page: window.page,
            per_page: window.per_page,
            total,
            total_pages,
            has_next: window.page < total_pages,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[aliases(DrawPageResponse = PaginatedResponse<DrawResponse>)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub pagination: PaginationInfo,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, window: PageWindow, total: i64) -> Self {
        Self {
            items,
            pagination: PaginationInfo::new(window, total),
        }
    }
}
