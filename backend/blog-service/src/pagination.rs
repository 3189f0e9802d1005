//! Page-number pagination for listings.
//!
//! A requested page that is missing or not an integer resolves to the first
//! page; an integer outside `1..=num_pages` resolves to the last page. An
//! empty collection still has one (empty) page. Nothing here ever fails.

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use serde::Serialize;
use std::convert::Infallible;
use std::future::{ready, Ready};

/// Posts shown per listing page unless configured otherwise.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Query string of paginated views (`?page=2`).
///
/// Extraction never fails: a repeated `page` takes its last value and an
/// unparsable query string counts as no page.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn parse(query: &str) -> Self {
        let pairs = web::Query::<Vec<(String, String)>>::from_query(query)
            .map(web::Query::into_inner)
            .unwrap_or_default();
        Self {
            page: pairs
                .into_iter()
                .rev()
                .find(|(key, _)| key == "page")
                .map(|(_, value)| value),
        }
    }
}

impl FromRequest for PageQuery {
    type Error = Infallible;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Self::parse(req.query_string())))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    per_page: u32,
}

/// Resolved slice boundaries for one page of a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u32,
    pub num_pages: u32,
    pub count: i64,
    pub offset: i64,
    pub limit: i64,
}

impl Paginator {
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    pub fn num_pages(&self, count: i64) -> u32 {
        if count <= 0 {
            return 1;
        }
        let per_page = i64::from(self.per_page);
        let pages = (count + per_page - 1) / per_page;
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn window(&self, count: i64, requested: Option<&str>) -> PageWindow {
        let num_pages = self.num_pages(count);
        let number = match requested.map(str::trim).map(str::parse::<i64>) {
            Some(Ok(n)) if n >= 1 && n <= i64::from(num_pages) => n as u32,
            Some(Ok(_)) => num_pages,
            Some(Err(_)) | None => 1,
        };

        let limit = i64::from(self.per_page);
        PageWindow {
            number,
            num_pages,
            count: count.max(0),
            offset: i64::from(number - 1) * limit,
            limit,
        }
    }
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PER_PAGE)
    }
}

/// One page of items plus the navigation metadata templates need.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub count: i64,
    pub has_next: bool,
    pub has_previous: bool,
    pub next_page_number: Option<u32>,
    pub previous_page_number: Option<u32>,
    /// 1-based index of the first item on this page (0 when empty)
    pub start_index: i64,
    pub end_index: i64,
    pub page_range: Vec<u32>,
}

impl<T> Page<T> {
    pub fn new(window: PageWindow, items: Vec<T>) -> Self {
        let has_next = window.number < window.num_pages;
        let has_previous = window.number > 1;
        let (start_index, end_index) = if items.is_empty() {
            (0, 0)
        } else {
            (window.offset + 1, window.offset + items.len() as i64)
        };

        Self {
            number: window.number,
            num_pages: window.num_pages,
            count: window.count,
            has_next,
            has_previous,
            next_page_number: has_next.then_some(window.number + 1),
            previous_page_number: has_previous.then(|| window.number - 1),
            start_index,
            end_index,
            page_range: (1..=window.num_pages).collect(),
            items,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
