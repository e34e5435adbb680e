use super::PageCursor;

/// Identifies one in-flight page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket(u64);

/// What the caller has to ask the source for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub cursor: Option<PageCursor>,
}

/// Paging state: continuation token, exhaustion and the in-flight guard.
///
/// At most one fetch is outstanding. `begin` while one is pending returns
/// `None` rather than queueing a second request. This holds across
/// `restart`: a request issued before it keeps the slot until its answer
/// lands, and that answer is then dropped.
#[derive(Debug)]
pub struct PageLoader {
    page_cursor: Option<PageCursor>,
    has_more: bool,
    total_count: Option<usize>,
    in_flight: Option<FetchTicket>,
    /// The in-flight request predates the last restart
    superseded: bool,
    next_ticket: u64,
    pages_loaded: usize,
}

impl PageLoader {
    pub fn new() -> Self {
        Self {
            page_cursor: None,
            has_more: true,
            total_count: None,
            in_flight: None,
            superseded: false,
            next_ticket: 0,
            pages_loaded: 0,
        }
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn page_cursor(&self) -> Option<&PageCursor> {
        self.page_cursor.as_ref()
    }

    pub fn total_count(&self) -> Option<usize> {
        self.total_count
    }

    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    pub fn is_first_page(&self) -> bool {
        self.pages_loaded == 0
    }

    /// Claims the in-flight slot, or `None` if exhausted or already fetching
    pub fn begin(&mut self) -> Option<FetchRequest> {
        if !self.has_more || self.in_flight.is_some() {
            return None;
        }

        let ticket = FetchTicket(self.next_ticket);
        self.next_ticket += 1;
        self.in_flight = Some(ticket);

        Some(FetchRequest {
            ticket,
            cursor: self.page_cursor.clone(),
        })
    }

    /// True when `ticket` holds the slot but was issued before a restart
    pub fn is_superseded(&self, ticket: FetchTicket) -> bool {
        self.superseded && self.in_flight == Some(ticket)
    }

    /// Releases the slot if `ticket` owns it. Returns whether its page should
    /// be applied: false for unknown tickets and for superseded ones.
    pub fn release(&mut self, ticket: FetchTicket) -> bool {
        if self.in_flight != Some(ticket) {
            return false;
        }
        self.in_flight = None;
        !std::mem::take(&mut self.superseded)
    }

    /// Records a committed page. `appended` is the number of new items it
    /// contributed after deduplication.
    pub fn advance(
        &mut self,
        next_cursor: Option<PageCursor>,
        has_more: bool,
        total_count: Option<usize>,
        appended: usize,
    ) {
        // A source that claims more pages but hands back neither a token nor
        // new items would restart from the first page forever.
        let stalled = has_more && next_cursor.is_none() && appended == 0;

        self.has_more = has_more && !stalled;
        self.page_cursor = if self.has_more { next_cursor } else { None };
        if total_count.is_some() {
            self.total_count = total_count;
        }
        self.pages_loaded += 1;
    }

    /// Forgets all paging progress. An outstanding request keeps blocking
    /// `begin` until it is released, and its page is discarded.
    pub fn restart(&mut self) {
        self.page_cursor = None;
        self.has_more = true;
        self.total_count = None;
        self.superseded = self.in_flight.is_some();
        self.pages_loaded = 0;
    }
}

impl Default for PageLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(token: &str) -> Option<PageCursor> {
        Some(PageCursor(token.to_string()))
    }

    #[test]
    fn test_new_loader_wants_first_page() {
        let mut loader = PageLoader::new();
        assert!(loader.has_more());
        assert!(loader.is_first_page());

        let request = loader.begin().unwrap();
        assert_eq!(request.cursor, None);
        assert!(loader.is_in_flight());
    }

    #[test]
    fn test_second_begin_is_coalesced() {
        let mut loader = PageLoader::new();
        assert!(loader.begin().is_some());
        assert!(loader.begin().is_none());
    }

    #[test]
    fn test_release_then_begin_uses_next_cursor() {
        let mut loader = PageLoader::new();
        let first = loader.begin().unwrap();
        assert!(loader.release(first.ticket));
        loader.advance(cursor("50"), true, Some(120), 50);

        let second = loader.begin().unwrap();
        assert_eq!(second.cursor, cursor("50"));
        assert_ne!(first.ticket, second.ticket);
        assert_eq!(loader.total_count(), Some(120));
        assert_eq!(loader.pages_loaded(), 1);
    }

    #[test]
    fn test_exhausted_loader_refuses_to_begin() {
        let mut loader = PageLoader::new();
        let request = loader.begin().unwrap();
        loader.release(request.ticket);
        loader.advance(None, false, None, 10);

        assert!(!loader.has_more());
        assert!(loader.begin().is_none());
        assert_eq!(loader.page_cursor(), None);
    }

    #[test]
    fn test_stalled_source_is_treated_as_exhausted() {
        let mut loader = PageLoader::new();
        let request = loader.begin().unwrap();
        loader.release(request.ticket);
        loader.advance(None, true, None, 0);

        assert!(!loader.has_more());
    }

    #[test]
    fn test_total_count_survives_pages_without_one() {
        let mut loader = PageLoader::new();
        loader.advance(cursor("1"), true, Some(7), 1);
        loader.advance(cursor("2"), true, None, 1);
        assert_eq!(loader.total_count(), Some(7));
    }

    #[test]
    fn test_restart_keeps_slot_until_old_request_lands() {
        let mut loader = PageLoader::new();
        let request = loader.begin().unwrap();
        loader.advance(cursor("10"), true, Some(30), 10);
        loader.restart();

        assert!(loader.is_in_flight());
        assert!(loader.is_superseded(request.ticket));
        assert!(loader.begin().is_none());

        assert!(!loader.release(request.ticket));
        assert!(!loader.is_in_flight());

        let fresh = loader.begin().unwrap();
        assert_eq!(fresh.cursor, None);
        assert!(!loader.is_superseded(fresh.ticket));
        assert!(loader.release(fresh.ticket));
    }

    #[test]
    fn test_restart_while_idle() {
        let mut loader = PageLoader::new();
        loader.restart();

        let request = loader.begin().unwrap();
        assert!(loader.release(request.ticket));
    }
}
