use serde::{Deserialize, Serialize};

use crate::validation::ValidationErrors;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 2000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Event properties a listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSortField {
    Id,
    Name,
    BeginEnrollmentDateTime,
    CloseEnrollmentDateTime,
    BeginEventDateTime,
    EndEventDateTime,
    Location,
    BasePrice,
    MaxPrice,
    LimitOfEnrollment,
    EventStatus,
}

impl EventSortField {
    const ALL: [EventSortField; 11] = [
        EventSortField::Id,
        EventSortField::Name,
        EventSortField::BeginEnrollmentDateTime,
        EventSortField::CloseEnrollmentDateTime,
        EventSortField::BeginEventDateTime,
        EventSortField::EndEventDateTime,
        EventSortField::Location,
        EventSortField::BasePrice,
        EventSortField::MaxPrice,
        EventSortField::LimitOfEnrollment,
        EventSortField::EventStatus,
    ];

    /// Name as it appears in the JSON representation and in `sort=` parameters.
    pub fn property(&self) -> &'static str {
        match self {
            EventSortField::Id => "id",
            EventSortField::Name => "name",
            EventSortField::BeginEnrollmentDateTime => "beginEnrollmentDateTime",
            EventSortField::CloseEnrollmentDateTime => "closeEnrollmentDateTime",
            EventSortField::BeginEventDateTime => "beginEventDateTime",
            EventSortField::EndEventDateTime => "endEventDateTime",
            EventSortField::Location => "location",
            EventSortField::BasePrice => "basePrice",
            EventSortField::MaxPrice => "maxPrice",
            EventSortField::LimitOfEnrollment => "limitOfEnrollment",
            EventSortField::EventStatus => "eventStatus",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            EventSortField::Id => "id",
            EventSortField::Name => "name",
            EventSortField::BeginEnrollmentDateTime => "begin_enrollment_date_time",
            EventSortField::CloseEnrollmentDateTime => "close_enrollment_date_time",
            EventSortField::BeginEventDateTime => "begin_event_date_time",
            EventSortField::EndEventDateTime => "end_event_date_time",
            EventSortField::Location => "location",
            EventSortField::BasePrice => "base_price",
            EventSortField::MaxPrice => "max_price",
            EventSortField::LimitOfEnrollment => "limit_of_enrollment",
            EventSortField::EventStatus => "event_status",
        }
    }

    pub fn from_property(property: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.property() == property)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    pub field: EventSortField,
    pub direction: Direction,
}

impl Sort {
    /// Parses `property[,ASC|DESC]`.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split(',').map(str::trim);
        let field = EventSortField::from_property(parts.next()?)?;
        let direction = match parts.next() {
            None | Some("") => Direction::Asc,
            Some(d) if d.eq_ignore_ascii_case("asc") => Direction::Asc,
            Some(d) if d.eq_ignore_ascii_case("desc") => Direction::Desc,
            Some(_) => return None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self { field, direction })
    }

    pub fn to_param(&self) -> String {
        format!("{},{}", self.field.property(), self.direction.as_str())
    }
}

/// Raw `page`, `size` and `sort` query parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Option<Sort>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: None,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self { page, ..*self }
    }
}

impl TryFrom<PageParams> for PageRequest {
    type Error = ValidationErrors;

    fn try_from(params: PageParams) -> Result<Self, Self::Error> {
        let size = match params.size {
            Some(0) | None => DEFAULT_PAGE_SIZE,
            Some(size) => size,
        };
        let mut request = PageRequest::new(params.page.unwrap_or(0), size);

        if let Some(raw) = params.sort.as_deref().filter(|s| !s.trim().is_empty()) {
            match Sort::parse(raw) {
                Some(sort) => request.sort = Some(sort),
                None => {
                    let mut errors = ValidationErrors::new("pageRequest");
                    errors.reject_value(
                        "sort",
                        "typeMismatch",
                        format!("cannot sort events by '{}'", raw),
                        Some(serde_json::Value::String(raw.to_string())),
                    );
                    return Err(errors);
                }
            }
        }

        Ok(request)
    }
}

/// One slice of a larger result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            number: request.page,
            size: request.size,
            total_elements,
        }
    }

    pub fn total_pages(&self) -> u32 {
        if self.size == 0 {
            return 0;
        }
        let pages = self.total_elements.div_ceil(u64::from(self.size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn has_next(&self) -> bool {
        self.number
            .checked_add(1)
            .is_some_and(|next| next < self.total_pages())
    }

    pub fn metadata(&self) -> PageMetadata {
        PageMetadata {
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages(),
            number: self.number,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub number: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parsing() {
        let sort = Sort::parse("name,DESC").unwrap();
        assert_eq!(sort.field, EventSortField::Name);
        assert_eq!(sort.direction, Direction::Desc);

        let sort = Sort::parse("beginEventDateTime").unwrap();
        assert_eq!(sort.direction, Direction::Asc);

        assert!(Sort::parse("password,DESC").is_none());
        assert!(Sort::parse("name,SIDEWAYS").is_none());
        assert!(Sort::parse("name,ASC,extra").is_none());
    }

    #[test]
    fn test_page_params_defaults() {
        let request = PageRequest::try_from(PageParams::default()).unwrap();
        assert_eq!(request, PageRequest::default());

        let params = PageParams {
            page: Some(1),
            size: Some(5000),
            sort: None,
        };
        let request = PageRequest::try_from(params).unwrap();
        assert_eq!(request.size, MAX_PAGE_SIZE);
        assert_eq!(request.offset(), u64::from(MAX_PAGE_SIZE));
    }

    #[test]
    fn test_unknown_sort_property_is_a_field_error() {
        let params = PageParams {
            sort: Some("secret,ASC".to_string()),
            ..Default::default()
        };
        let errors = PageRequest::try_from(params).unwrap_err();
        assert!(errors.has_field_error("sort"));
    }

    #[test]
    fn test_page_navigation() {
        let request = PageRequest::new(1, 10);
        let page = Page::new(vec![0; 10], &request, 30);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_previous());
        assert!(page.has_next());

        let last = Page::new(vec![0; 10], &request.with_page(2), 30);
        assert!(!last.has_next());

        let empty: Page<i32> = Page::new(vec![], &PageRequest::default(), 0);
        assert_eq!(empty.total_pages(), 0);
        assert!(!empty.has_next());
    }

    #[test]
    fn test_last_representable_page_has_no_next() {
        let request = PageRequest::new(u32::MAX, 1);
        let page: Page<i32> = Page::new(vec![], &request, 1);
        assert!(!page.has_next());
        assert!(page.has_previous());
    }
}
