// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::{Duration, Instant};

use crate::model::{ActionKind, ActionSpec, Row, ScreenKind, filter_rows};

/// How long a toast stays on screen before the poll loop dismisses it.
pub const NOTIFICATION_TTL: Duration = Duration::from_millis(3000);

/// Parent scope a drill-down pane was opened with. The label rides along
/// so the child pane can title itself without refetching the parent row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentScope {
    pub key: i64,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    deadline: Instant,
}

impl Notification {
    fn new(message: String, severity: Severity, now: Instant) -> Self {
        Self {
            message,
            severity,
            deadline: now + NOTIFICATION_TTL,
        }
    }

    pub fn expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// Monotonic token handed out per fetch. A response is applied only when
/// its ticket still matches the pane's current generation, so a slow
/// response for an abandoned scope can never overwrite fresher rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteConfirm {
    Idle,
    /// Waiting on the operator; delete has not been issued yet.
    Confirming { row_id: i64, label: String },
    /// The row cannot be deleted; shown as a notice instead of a prompt.
    Blocked { label: String, dependents: usize },
}

/// State for one pane of the console. Every screen, flat or drill-down,
/// runs the same lifecycle: resolve scope, fetch, filter, select, act.
#[derive(Debug)]
pub struct PaneState {
    pub screen: ScreenKind,
    pub parent: Option<ParentScope>,
    pub items: Vec<Row>,
    pub search_term: String,
    pub selected_id: Option<i64>,
    pub loading: bool,
    pub confirm: DeleteConfirm,
    pub notification: Option<Notification>,
    /// A mutation round-trip is outstanding; action dispatch is refused
    /// until it completes.
    busy: bool,
    fetch_generation: u64,
    needs_refetch: bool,
}

impl PaneState {
    /// Opens a pane, resolving its parent scope up front. Entering a pane
    /// always starts clean: stale rows, search text and selection from a
    /// previous visit never leak into the new scope.
    pub fn open(screen: ScreenKind, parent: Option<ParentScope>) -> Self {
        debug_assert_eq!(screen.is_scoped(), parent.is_some());
        Self {
            screen,
            parent,
            items: Vec::new(),
            search_term: String::new(),
            selected_id: None,
            loading: false,
            confirm: DeleteConfirm::Idle,
            notification: None,
            busy: false,
            fetch_generation: 0,
            needs_refetch: true,
        }
    }

    pub fn parent_key(&self) -> Option<i64> {
        self.parent.as_ref().map(|scope| scope.key)
    }

    /// True when the pane wants a (re)fetch: on open and after every
    /// successful mutation.
    pub fn needs_refetch(&self) -> bool {
        self.needs_refetch
    }

    /// Asks for a manual reload on the next poll.
    pub fn request_refetch(&mut self) {
        self.needs_refetch = true;
    }

    /// Starts a fetch, invalidating any response still in flight.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.fetch_generation += 1;
        self.loading = true;
        self.needs_refetch = false;
        FetchTicket(self.fetch_generation)
    }

    /// Applies a fetch response. Responses from superseded tickets are
    /// dropped whole, including their errors. A failed fetch leaves items
    /// and selection at their prior values; only the error toast is raised.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, result: Result<Vec<Row>, String>, now: Instant) {
        if ticket.0 != self.fetch_generation {
            return;
        }
        self.loading = false;
        match result {
            Ok(rows) => {
                if let Some(id) = self.selected_id {
                    if !rows.iter().any(|row| row.id() == id) {
                        self.selected_id = None;
                    }
                }
                self.items = rows;
            }
            Err(message) => self.notify(message, Severity::Error, now),
        }
    }

    /// Rows after the search filter, in fetch order.
    pub fn visible_rows(&self) -> Vec<&Row> {
        filter_rows(&self.items, &self.search_term)
    }

    pub fn set_search_term(&mut self, term: String) {
        self.search_term = term;
    }

    pub fn select(&mut self, row_id: i64) {
        if self.items.iter().any(|row| row.id() == row_id) {
            self.selected_id = Some(row_id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected_id = None;
    }

    pub fn selected_row(&self) -> Option<&Row> {
        let id = self.selected_id?;
        self.items.iter().find(|row| row.id() == id)
    }

    /// Whether an action may be dispatched right now. Combines the
    /// declarative enablement rule with the in-flight guard, so a
    /// double-pressed button cannot issue a second mutation while the
    /// first is still outstanding.
    pub fn action_enabled(&self, action: &ActionSpec) -> bool {
        !self.busy && !self.loading && action.is_enabled(self.selected_row())
    }

    /// Claims the mutation slot. Returns false (and does nothing) when a
    /// mutation is already outstanding.
    pub fn begin_mutation(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        true
    }

    /// Releases the mutation slot and reports the outcome. Success
    /// schedules a refetch; failure keeps the current rows and surfaces
    /// the error.
    pub fn complete_mutation(&mut self, result: Result<String, String>, now: Instant) {
        self.busy = false;
        match result {
            Ok(message) => {
                self.needs_refetch = true;
                self.notify(message, Severity::Info, now);
            }
            Err(message) => self.notify(message, Severity::Error, now),
        }
    }

    /// Opens the delete confirmation for the selected row, or the blocked
    /// notice when the usage guard reports live dependents. The caller
    /// runs the dependent count before calling this for guarded screens.
    pub fn request_delete(&mut self, dependents: usize) {
        let Some(row) = self.selected_row() else {
            return;
        };
        self.confirm = if dependents > 0 {
            DeleteConfirm::Blocked {
                label: row.label(),
                dependents,
            }
        } else {
            DeleteConfirm::Confirming {
                row_id: row.id(),
                label: row.label(),
            }
        };
    }

    /// Confirms the pending delete, claiming the mutation slot. Returns
    /// the row id to delete, or None when there is nothing to confirm or
    /// a mutation is already in flight.
    pub fn confirm_delete(&mut self) -> Option<i64> {
        let DeleteConfirm::Confirming { row_id, .. } = self.confirm else {
            return None;
        };
        if !self.begin_mutation() {
            return None;
        }
        self.confirm = DeleteConfirm::Idle;
        Some(row_id)
    }

    /// Dismisses the confirmation or blocked notice without acting.
    /// Idempotent; safe to call from Idle.
    pub fn cancel_delete(&mut self) {
        self.confirm = DeleteConfirm::Idle;
    }

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity, now: Instant) {
        self.notification = Some(Notification::new(message.into(), severity, now));
    }

    /// Clears the toast. Manual dismissal and the timer race benignly;
    /// dismissing twice is a no-op.
    pub fn dismiss_notification(&mut self) {
        self.notification = None;
    }

    /// Poll-loop housekeeping: expire the toast once its deadline passes.
    pub fn tick(&mut self, now: Instant) {
        if self
            .notification
            .as_ref()
            .is_some_and(|toast| toast.expired(now))
        {
            self.notification = None;
        }
    }
}

/// The drill-down stack. The bottom pane is a menu screen; each drill
/// pushes a child pane carrying its parent scope, and Esc pops back to a
/// parent whose state survived untouched.
#[derive(Debug)]
pub struct PaneStack {
    panes: Vec<PaneState>,
}

impl PaneStack {
    pub fn new(root: ScreenKind, scope: Option<ParentScope>) -> Self {
        Self {
            panes: vec![PaneState::open(root, scope)],
        }
    }

    pub fn top(&self) -> &PaneState {
        // Invariant: never empty; pop() refuses to remove the root.
        self.panes.last().unwrap()
    }

    pub fn top_mut(&mut self) -> &mut PaneState {
        self.panes.last_mut().unwrap()
    }

    pub fn depth(&self) -> usize {
        self.panes.len()
    }

    /// Replaces the whole stack with a fresh root pane. Barangays are the
    /// one menu screen that needs a scope here; the console passes its
    /// configured district.
    pub fn switch_root(&mut self, screen: ScreenKind, scope: Option<ParentScope>) {
        self.panes.clear();
        self.panes.push(PaneState::open(screen, scope));
    }

    /// Drills into a child screen scoped to the selected row of the top
    /// pane. Refused when the action's enablement rule does not hold.
    pub fn drill(&mut self, action: &ActionSpec) -> bool {
        let ActionKind::Drill(target) = action.kind else {
            return false;
        };
        if !self.top().action_enabled(action) {
            return false;
        }
        let Some(row) = self.top().selected_row() else {
            return false;
        };
        let scope = if target.is_scoped() {
            Some(ParentScope {
                key: row.id(),
                label: row.label(),
            })
        } else {
            None
        };
        self.panes.push(PaneState::open(target, scope));
        true
    }

    /// Pops back to the parent pane. The root pane stays.
    pub fn pop(&mut self) -> bool {
        if self.panes.len() > 1 {
            self.panes.pop();
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Classification, Kind, Subclass};
    use crate::ids::{ClassificationId, KindId, SubclassId};
    use time::macros::datetime;

    fn classification(id: i64, name: &str) -> Row {
        Row::Classification(Classification {
            id: ClassificationId::new(id),
            classification: name.to_owned(),
            created_at: datetime!(2025-06-01 00:00:00 UTC),
        })
    }

    fn subclass(id: i64, class_id: i64, name: &str) -> Row {
        Row::Subclass(Subclass {
            id: SubclassId::new(id),
            class_id: ClassificationId::new(class_id),
            barangay_id: None,
            subclass: name.to_owned(),
            created_at: datetime!(2025-06-01 00:00:00 UTC),
        })
    }

    fn kind(id: i64, description: &str) -> Row {
        Row::Kind(Kind {
            id: KindId::new(id),
            description: description.to_owned(),
            created_at: datetime!(2025-06-01 00:00:00 UTC),
        })
    }

    fn now() -> Instant {
        Instant::now()
    }

    #[test]
    fn stale_fetch_response_is_dropped() {
        let mut pane = PaneState::open(ScreenKind::Classification, None);
        let stale = pane.begin_fetch();
        let fresh = pane.begin_fetch();

        pane.apply_fetch(fresh, Ok(vec![classification(1, "RESIDENTIAL")]), now());
        pane.apply_fetch(stale, Ok(vec![classification(2, "COMMERCIAL")]), now());

        assert_eq!(pane.items.len(), 1);
        assert_eq!(pane.items[0].id(), 1);
        assert!(!pane.loading);
    }

    #[test]
    fn stale_fetch_error_is_dropped_too() {
        let mut pane = PaneState::open(ScreenKind::Classification, None);
        let stale = pane.begin_fetch();
        let fresh = pane.begin_fetch();

        pane.apply_fetch(fresh, Ok(vec![classification(1, "RESIDENTIAL")]), now());
        pane.apply_fetch(stale, Err("connection reset".to_owned()), now());

        assert_eq!(pane.items.len(), 1);
        assert!(pane.notification.is_none());
    }

    #[test]
    fn fetch_error_keeps_prior_rows_and_raises_toast() {
        let mut pane = PaneState::open(ScreenKind::Classification, None);
        let ticket = pane.begin_fetch();
        pane.apply_fetch(ticket, Ok(vec![classification(1, "RESIDENTIAL")]), now());
        pane.select(1);

        let ticket = pane.begin_fetch();
        pane.apply_fetch(ticket, Err("disk I/O error".to_owned()), now());

        // The last good rows stay on screen; only the toast reports the
        // failure.
        assert_eq!(pane.items.len(), 1);
        assert_eq!(pane.selected_id, Some(1));
        assert!(!pane.loading);
        let toast = pane.notification.as_ref().unwrap();
        assert_eq!(toast.severity, Severity::Error);
    }

    #[test]
    fn selection_survives_refetch_only_if_row_still_present() {
        let mut pane = PaneState::open(ScreenKind::Classification, None);
        let ticket = pane.begin_fetch();
        pane.apply_fetch(
            ticket,
            Ok(vec![classification(1, "RESIDENTIAL"), classification(2, "COMMERCIAL")]),
            now(),
        );
        pane.select(2);

        let ticket = pane.begin_fetch();
        pane.apply_fetch(ticket, Ok(vec![classification(2, "COMMERCIAL")]), now());
        assert_eq!(pane.selected_id, Some(2));

        let ticket = pane.begin_fetch();
        pane.apply_fetch(ticket, Ok(vec![classification(1, "RESIDENTIAL")]), now());
        assert_eq!(pane.selected_id, None);
    }

    #[test]
    fn select_ignores_unknown_ids() {
        let mut pane = PaneState::open(ScreenKind::Classification, None);
        let ticket = pane.begin_fetch();
        pane.apply_fetch(ticket, Ok(vec![classification(1, "RESIDENTIAL")]), now());

        pane.select(99);
        assert_eq!(pane.selected_id, None);
    }

    #[test]
    fn double_submit_claims_mutation_slot_once() {
        let mut pane = PaneState::open(ScreenKind::Barangay, None);
        assert!(pane.begin_mutation());
        assert!(!pane.begin_mutation());

        pane.complete_mutation(Ok("barangay added".to_owned()), now());
        assert!(pane.needs_refetch());
        assert!(pane.begin_mutation());
    }

    #[test]
    fn failed_mutation_keeps_rows_and_reports_error() {
        let mut pane = PaneState::open(ScreenKind::Barangay, None);
        let ticket = pane.begin_fetch();
        pane.apply_fetch(ticket, Ok(vec![classification(1, "RESIDENTIAL")]), now());

        assert!(pane.begin_mutation());
        pane.complete_mutation(Err("UNIQUE constraint failed".to_owned()), now());

        assert!(!pane.needs_refetch());
        assert_eq!(pane.items.len(), 1);
        assert_eq!(pane.notification.as_ref().unwrap().severity, Severity::Error);
    }

    #[test]
    fn delete_flow_confirm_then_complete() {
        let mut pane = PaneState::open(ScreenKind::Classification, None);
        let ticket = pane.begin_fetch();
        pane.apply_fetch(ticket, Ok(vec![classification(3, "INDUSTRIAL")]), now());
        pane.select(3);

        pane.request_delete(0);
        assert!(matches!(pane.confirm, DeleteConfirm::Confirming { row_id: 3, .. }));

        assert_eq!(pane.confirm_delete(), Some(3));
        assert_eq!(pane.confirm, DeleteConfirm::Idle);
        // The slot is held until the delete round-trip completes.
        assert!(!pane.begin_mutation());

        pane.complete_mutation(Ok("classification deleted".to_owned()), now());
        assert!(pane.needs_refetch());
    }

    #[test]
    fn delete_with_dependents_is_blocked_not_confirmed() {
        let mut pane = PaneState::open(ScreenKind::Classification, None);
        let ticket = pane.begin_fetch();
        pane.apply_fetch(ticket, Ok(vec![classification(3, "INDUSTRIAL")]), now());
        pane.select(3);

        pane.request_delete(4);
        assert!(matches!(
            pane.confirm,
            DeleteConfirm::Blocked { dependents: 4, .. }
        ));
        assert_eq!(pane.confirm_delete(), None);

        pane.cancel_delete();
        assert_eq!(pane.confirm, DeleteConfirm::Idle);
        pane.cancel_delete();
        assert_eq!(pane.confirm, DeleteConfirm::Idle);
    }

    #[test]
    fn request_delete_without_selection_is_a_no_op() {
        let mut pane = PaneState::open(ScreenKind::Classification, None);
        pane.request_delete(0);
        assert_eq!(pane.confirm, DeleteConfirm::Idle);
    }

    #[test]
    fn notification_expires_after_ttl() {
        let start = now();
        let mut pane = PaneState::open(ScreenKind::Classification, None);
        pane.notify("saved", Severity::Info, start);

        pane.tick(start + Duration::from_millis(2999));
        assert!(pane.notification.is_some());

        pane.tick(start + NOTIFICATION_TTL);
        assert!(pane.notification.is_none());

        // Timer firing after a manual dismiss is harmless.
        pane.dismiss_notification();
        pane.tick(start + Duration::from_secs(10));
        assert!(pane.notification.is_none());
    }

    #[test]
    fn newer_toast_restarts_the_clock() {
        let start = now();
        let mut pane = PaneState::open(ScreenKind::Classification, None);
        pane.notify("first", Severity::Info, start);
        pane.notify("second", Severity::Info, start + Duration::from_millis(2000));

        pane.tick(start + Duration::from_millis(4000));
        assert_eq!(pane.notification.as_ref().unwrap().message, "second");

        pane.tick(start + Duration::from_millis(5000));
        assert!(pane.notification.is_none());
    }

    #[test]
    fn drill_carries_parent_scope_and_pop_restores_parent() {
        let mut stack = PaneStack::new(ScreenKind::Classification, None);
        let ticket = stack.top_mut().begin_fetch();
        stack.top_mut().apply_fetch(
            ticket,
            Ok(vec![classification(7, "RESIDENTIAL")]),
            now(),
        );
        stack.top_mut().select(7);
        stack.top_mut().set_search_term("res".to_owned());

        let drill = ScreenKind::Classification.actions()[3];
        assert!(stack.drill(&drill));
        assert_eq!(stack.depth(), 2);

        let child = stack.top();
        assert_eq!(child.screen, ScreenKind::Subclass);
        assert_eq!(child.parent_key(), Some(7));
        assert_eq!(child.parent.as_ref().unwrap().label, "RESIDENTIAL");
        assert!(child.search_term.is_empty());
        assert!(child.needs_refetch());

        assert!(stack.pop());
        assert_eq!(stack.top().search_term, "res");
        assert_eq!(stack.top().selected_id, Some(7));
        assert!(!stack.pop());
    }

    #[test]
    fn drill_refused_without_selection_or_when_predicate_fails() {
        let mut stack = PaneStack::new(ScreenKind::Kind, None);
        let structures = ScreenKind::Kind.actions()[4];
        assert!(!stack.drill(&structures));

        let ticket = stack.top_mut().begin_fetch();
        stack
            .top_mut()
            .apply_fetch(ticket, Ok(vec![kind(7, "LAND"), kind(8, "BUILDING")]), now());

        stack.top_mut().select(7);
        assert!(!stack.drill(&structures));

        stack.top_mut().select(8);
        assert!(stack.drill(&structures));
        // Structure is a flat screen; the drill opens it unscoped.
        assert_eq!(stack.top().parent_key(), None);
    }

    #[test]
    fn reopening_a_scope_starts_clean() {
        let mut stack = PaneStack::new(ScreenKind::Classification, None);
        let ticket = stack.top_mut().begin_fetch();
        stack.top_mut().apply_fetch(
            ticket,
            Ok(vec![classification(1, "RESIDENTIAL"), classification(2, "COMMERCIAL")]),
            now(),
        );

        let drill = ScreenKind::Classification.actions()[3];
        stack.top_mut().select(1);
        assert!(stack.drill(&drill));
        let ticket = stack.top_mut().begin_fetch();
        stack
            .top_mut()
            .apply_fetch(ticket, Ok(vec![subclass(10, 1, "R-1")]), now());
        stack.top_mut().select(10);
        stack.pop();

        // Same child screen, different parent: nothing leaks across.
        stack.top_mut().select(2);
        assert!(stack.drill(&drill));
        let child = stack.top();
        assert_eq!(child.parent_key(), Some(2));
        assert!(child.items.is_empty());
        assert_eq!(child.selected_id, None);
    }

    #[test]
    fn actions_disabled_while_loading_or_busy() {
        let mut pane = PaneState::open(ScreenKind::Barangay, None);
        let create = ScreenKind::Barangay.actions()[0];

        let ticket = pane.begin_fetch();
        assert!(!pane.action_enabled(&create));
        pane.apply_fetch(ticket, Ok(Vec::new()), now());
        assert!(pane.action_enabled(&create));

        assert!(pane.begin_mutation());
        assert!(!pane.action_enabled(&create));
        pane.complete_mutation(Ok("added".to_owned()), now());
        assert!(pane.action_enabled(&create));
    }
}
