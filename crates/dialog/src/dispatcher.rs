//! The dialog dispatcher — a state machine over each caller's session.
//!
//! Every inbound message is evaluated in fixed priority order, first match
//! wins: cancellation keywords, then the active flow's continuation, then the
//! fixed command vocabulary, then the search fallback. Malformed continuation
//! input re-prompts and keeps the flow open; duplicates are reported outcome
//! categories, not errors; storage failures surface as a plain retry reply
//! and never leak internal error text.

use crate::parse;
use crate::session::{Flow, IndexOp, Menu, SessionState, SessionStore};
use ordbok_core::error::StoreError;
use ordbok_core::record::Suggestion;
use ordbok_core::reply::{CallerId, Inbound, Keyboard, Reply};
use ordbok_store::store::{AddOutcome, BatchOutcome, SubmitOutcome};
use ordbok_store::{RecordStore, search};
use std::sync::Arc;
use tracing::{debug, warn};

/// Search queries shorter than this are rejected before the matcher runs.
const MIN_QUERY_CHARS: usize = 3;

/// Bulk add accepts at most this many record lines per message.
const MAX_BULK_LINES: usize = 100;

/// The example shown whenever a five-field record is expected.
const RECORD_FORMAT: &str = "å danse,danser,danset,har danset,to dance";

/// Commands a non-privileged caller is denied with a fixed message.
const ADMIN_COMMANDS: &[&str] = &[
    "add",
    "suggestions",
    "contacts",
    "add-by-index",
    "add-all",
    "delete-by-index",
    "delete-all",
    "edit-by-index",
];

/// The dialog dispatcher. One instance serves every caller; per-caller state
/// lives in the session store.
pub struct Dispatcher {
    store: Arc<RecordStore>,
    sessions: SessionStore,
    admin_id: CallerId,
}

impl Dispatcher {
    pub fn new(store: Arc<RecordStore>, admin_id: CallerId) -> Self {
        Self {
            store,
            sessions: SessionStore::new(),
            admin_id,
        }
    }

    /// Interpret one inbound message and produce the response descriptor.
    pub async fn handle(&self, msg: &Inbound) -> Reply {
        let text = msg.text.trim();
        let is_admin = msg.caller_id == self.admin_id;
        let session = self.sessions.get(&msg.caller_id).await;
        debug!(caller = %msg.caller_id, chars = text.chars().count(), "incoming message");

        if let Some(reply) = self.handle_cancellation(msg, text, is_admin, &session).await {
            return reply;
        }
        if let Some(reply) = self.handle_continuation(msg, text, is_admin, &session).await {
            return reply;
        }
        if let Some(reply) = self.handle_command(msg, text, is_admin).await {
            return reply;
        }
        self.handle_search(msg, text, is_admin).await
    }

    // --- Priority 1: cancellation keywords ---

    async fn handle_cancellation(
        &self,
        msg: &Inbound,
        text: &str,
        is_admin: bool,
        session: &SessionState,
    ) -> Option<Reply> {
        let lowered = text.to_lowercase();

        if lowered == "cancel" && is_admin && session.flow == Flow::AwaitingBulkAdd {
            self.sessions.reset_flow(&msg.caller_id).await;
            return Some(Reply::plain("Adding cancelled.", main_keyboard(is_admin)));
        }
        if lowered != "back" {
            return None;
        }

        if is_admin && session.menu == Some(Menu::Contacts) {
            self.sessions.update(&msg.caller_id, |s| s.menu = None).await;
            return Some(Reply::plain("Back to the main menu.", main_keyboard(is_admin)));
        }
        // Leaving the suggestions menu clears every sub-flow it owns.
        if is_admin && session.menu == Some(Menu::Suggestions) {
            self.sessions
                .update(&msg.caller_id, |s| {
                    s.menu = None;
                    s.flow = Flow::Idle;
                })
                .await;
            return Some(Reply::plain("Back to the main menu.", main_keyboard(is_admin)));
        }
        if session.flow == Flow::AwaitingSuggestion {
            self.sessions.reset_flow(&msg.caller_id).await;
            return Some(Reply::plain("Back to the main menu.", main_keyboard(is_admin)));
        }
        None
    }

    // --- Priority 2: active flow continuations ---

    async fn handle_continuation(
        &self,
        msg: &Inbound,
        text: &str,
        is_admin: bool,
        session: &SessionState,
    ) -> Option<Reply> {
        match session.flow {
            Flow::AwaitingSuggestion => Some(self.continue_suggestion(msg, text, is_admin).await),
            Flow::AwaitingBulkAdd if is_admin => Some(self.continue_bulk_add(msg, text).await),
            Flow::AwaitingIndices(op) if is_admin => {
                Some(self.continue_indices(msg, text, op).await)
            }
            Flow::AwaitingEditTarget if is_admin => Some(self.continue_edit_target(msg, text).await),
            Flow::AwaitingEditPayload(index) if is_admin => {
                Some(self.continue_edit_payload(msg, text, index).await)
            }
            _ => None,
        }
    }

    async fn continue_suggestion(&self, msg: &Inbound, text: &str, is_admin: bool) -> Reply {
        let Some(entry) = parse::record(text) else {
            return Reply::formatted(
                format!("<b>Wrong format. Use:</b> {RECORD_FORMAT}"),
                Keyboard::BackOnly,
            );
        };

        let sug = Suggestion::from_entry(entry, msg.caller_id.0.clone(), msg.caller_name.as_deref());
        match self.store.submit_suggestion(sug).await {
            Ok(SubmitOutcome::InDictionary) => {
                self.sessions.reset_flow(&msg.caller_id).await;
                Reply::formatted(
                    "<b>This word is already in the dictionary.</b>",
                    main_keyboard(is_admin),
                )
            }
            Ok(SubmitOutcome::AlreadySuggested) => {
                self.sessions.reset_flow(&msg.caller_id).await;
                Reply::formatted(
                    "<b>This suggestion is already under review.</b>",
                    main_keyboard(is_admin),
                )
            }
            Ok(SubmitOutcome::Accepted) => {
                self.sessions.reset_flow(&msg.caller_id).await;
                Reply::plain(
                    "Thanks! The word was submitted for review by the administrator.",
                    main_keyboard(is_admin),
                )
            }
            Err(e) => storage_failure(e, Keyboard::BackOnly),
        }
    }

    async fn continue_bulk_add(&self, msg: &Inbound, text: &str) -> Reply {
        let lines: Vec<&str> = text.lines().collect();
        if lines.len() > MAX_BULK_LINES {
            return Reply::formatted(
                "<b>At most 100 lines per message.</b> Please shorten the list.",
                Keyboard::CancelOnly,
            );
        }

        let mut rows = Vec::with_capacity(lines.len());
        for line in &lines {
            match parse::record(line) {
                Some(entry) => rows.push(entry),
                None => {
                    return Reply::formatted(
                        format!(
                            "<b>Error in line:</b> '{line}'. <b>Use the format:</b> {RECORD_FORMAT}"
                        ),
                        Keyboard::CancelOnly,
                    );
                }
            }
        }

        match self.store.add_verbs(rows).await {
            Ok(outcome) => {
                self.sessions.reset_flow(&msg.caller_id).await;
                Reply::plain(batch_summary(&outcome), main_keyboard(true))
            }
            Err(e) => storage_failure(e, Keyboard::CancelOnly),
        }
    }

    async fn continue_indices(&self, msg: &Inbound, text: &str, op: IndexOp) -> Reply {
        let Some(indices) = parse::indices(text) else {
            return Reply::formatted(
                "<b>Enter row numbers separated by commas</b>, for example: 1, 3, 4",
                Keyboard::SuggestionsMenu,
            );
        };

        let result = match op {
            IndexOp::Promote => self
                .store
                .promote_by_indices(&indices)
                .await
                .map(|outcome| batch_summary(&outcome)),
            IndexOp::Delete => self
                .store
                .delete_suggestions(&indices)
                .await
                .map(|removed| format!("Deleted: {}", removed.join(", "))),
        };

        match result {
            Ok(summary) => {
                self.leave_suggestions_menu(&msg.caller_id).await;
                Reply::plain(summary, main_keyboard(true))
            }
            Err(StoreError::IndexOutOfRange { len }) => Reply::formatted(
                format!("<b>Some indices are out of range.</b> Enter numbers from 1 to {len}"),
                Keyboard::SuggestionsMenu,
            ),
            Err(e) => storage_failure(e, Keyboard::SuggestionsMenu),
        }
    }

    async fn continue_edit_target(&self, msg: &Inbound, text: &str) -> Reply {
        let Some(index) = parse::index(text) else {
            return Reply::formatted(
                "<b>Enter a row number</b>, for example: 1",
                Keyboard::SuggestionsMenu,
            );
        };

        let pending = self.store.suggestions().await;
        if index >= pending.len() {
            return Reply::formatted(
                format!(
                    "<b>Index out of range.</b> Enter a number from 1 to {}",
                    pending.len()
                ),
                Keyboard::SuggestionsMenu,
            );
        }

        let infinitive = pending[index].infinitive.clone();
        self.sessions
            .update(&msg.caller_id, |s| s.flow = Flow::AwaitingEditPayload(index))
            .await;
        Reply::formatted(
            format!(
                "Enter the new record for {infinitive} in the format:\n<b>å legge,legger,la,har lagt,to lay</b>"
            ),
            Keyboard::SuggestionsMenu,
        )
    }

    async fn continue_edit_payload(&self, msg: &Inbound, text: &str, index: usize) -> Reply {
        let Some(entry) = parse::record(text) else {
            return Reply::formatted(
                format!("<b>Wrong format. Use:</b> {RECORD_FORMAT}"),
                Keyboard::SuggestionsMenu,
            );
        };

        match self.store.replace_suggestion(index, entry).await {
            Ok(updated) => {
                self.leave_suggestions_menu(&msg.caller_id).await;
                Reply::formatted(
                    format!(
                        "Row {} updated:\n<b>Infinitive:</b> {}\n<b>Present:</b> {}\n\
                         <b>Past:</b> {}\n<b>Past participle:</b> {}\n<b>Translation:</b> {}",
                        index + 1,
                        updated.infinitive,
                        updated.present,
                        updated.past,
                        updated.past_participle,
                        updated.translation
                    ),
                    main_keyboard(true),
                )
            }
            Err(StoreError::IndexOutOfRange { len }) => Reply::formatted(
                format!("<b>Index out of range.</b> Enter a number from 1 to {len}"),
                Keyboard::SuggestionsMenu,
            ),
            Err(e) => storage_failure(e, Keyboard::SuggestionsMenu),
        }
    }

    // --- Priority 3: fixed command vocabulary ---

    async fn handle_command(&self, msg: &Inbound, text: &str, is_admin: bool) -> Option<Reply> {
        let lowered = text.to_lowercase();

        if lowered.starts_with("/add") && is_admin {
            let payload = text["/add".len()..].trim();
            return Some(self.cmd_add_one(payload).await);
        }

        match lowered.as_str() {
            "start" => Some(self.cmd_start(msg, is_admin).await),
            "suggest-word" => Some(self.cmd_suggest_word(&msg.caller_id).await),
            "add" if is_admin => Some(self.cmd_bulk_add(&msg.caller_id).await),
            "suggestions" if is_admin => Some(self.cmd_suggestions(&msg.caller_id).await),
            "contacts" if is_admin => Some(self.cmd_contacts(&msg.caller_id).await),
            "add-by-index" if is_admin => {
                Some(self.cmd_index_op(&msg.caller_id, IndexOp::Promote).await)
            }
            "delete-by-index" if is_admin => {
                Some(self.cmd_index_op(&msg.caller_id, IndexOp::Delete).await)
            }
            "add-all" if is_admin => Some(self.cmd_add_all(&msg.caller_id).await),
            "delete-all" if is_admin => Some(self.cmd_delete_all(&msg.caller_id).await),
            "edit-by-index" if is_admin => Some(self.cmd_edit(&msg.caller_id).await),
            _ if !is_admin
                && (ADMIN_COMMANDS.contains(&lowered.as_str()) || lowered.starts_with("/add")) =>
            {
                // Fixed denial, no state change.
                Some(Reply::plain(
                    "This command is only available to the administrator.",
                    main_keyboard(false),
                ))
            }
            _ => None,
        }
    }

    async fn cmd_start(&self, msg: &Inbound, is_admin: bool) -> Reply {
        // The privileged caller is never recorded in the contact log.
        if !is_admin {
            if let Err(e) = self
                .store
                .upsert_contact(&msg.caller_id.0, msg.caller_name.as_deref())
                .await
            {
                return storage_failure(e, main_keyboard(is_admin));
            }
        }
        Reply::formatted(
            "Hi! Type a Norwegian verb or a translation and I will show its forms.\n\
             <b>Search matches partial text (at least 3 characters)</b>, \
             for example 'legge' finds every variant containing 'legge'.\n\
             <b>Use 'suggest-word'</b> to propose a new entry.",
            main_keyboard(is_admin),
        )
    }

    async fn cmd_suggest_word(&self, caller: &CallerId) -> Reply {
        self.sessions
            .update(caller, |s| s.flow = Flow::AwaitingSuggestion)
            .await;
        Reply::formatted(
            format!(
                "<b>Suggest a word in the format:</b> {RECORD_FORMAT}\n\
                 <b>Press 'back'</b> to cancel."
            ),
            Keyboard::BackOnly,
        )
    }

    async fn cmd_bulk_add(&self, caller: &CallerId) -> Reply {
        self.sessions
            .update(caller, |s| s.flow = Flow::AwaitingBulkAdd)
            .await;
        Reply::formatted(
            format!(
                "Enter verbs in the format: <b>{RECORD_FORMAT}</b>\n\
                 <b>Up to 100 lines</b> per message, one record per line.\n\
                 <b>Press 'cancel'</b> if you change your mind."
            ),
            Keyboard::CancelOnly,
        )
    }

    async fn cmd_suggestions(&self, caller: &CallerId) -> Reply {
        self.sessions
            .update(caller, |s| s.menu = Some(Menu::Suggestions))
            .await;

        let pending = self.store.suggestions().await;
        if pending.is_empty() {
            return Reply::formatted(
                "The suggestion list is empty.\n<b>Press 'back'</b> to return.",
                Keyboard::BackOnly,
            );
        }

        let mut out = String::from("Pending suggestions:\n");
        for (i, sug) in pending.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, sug.entry()));
        }
        out.push_str("\n<b>Press 'back'</b> to return.");
        Reply::formatted(out, Keyboard::SuggestionsMenu)
    }

    async fn cmd_contacts(&self, caller: &CallerId) -> Reply {
        self.sessions
            .update(caller, |s| s.menu = Some(Menu::Contacts))
            .await;

        let contacts = self.store.contacts().await;
        if contacts.is_empty() {
            return Reply::formatted(
                "The contact list is empty.\n<b>Press 'back'</b> to return.",
                Keyboard::BackOnly,
            );
        }

        let mut out = String::from("Bot users:\n");
        for (i, contact) in contacts.iter().enumerate() {
            out.push_str(&format!(
                "{}. ID: {}, @{}, Contact: {}\n",
                i + 1,
                contact.user_id,
                contact.username,
                contact.contact_info
            ));
        }
        out.push_str("\n<b>Press 'back'</b> to return.");
        Reply::formatted(out, Keyboard::BackOnly)
    }

    async fn cmd_index_op(&self, caller: &CallerId, op: IndexOp) -> Reply {
        self.sessions
            .update(caller, |s| {
                s.menu = Some(Menu::Suggestions);
                s.flow = Flow::AwaitingIndices(op);
            })
            .await;
        let verb = match op {
            IndexOp::Promote => "add",
            IndexOp::Delete => "delete",
        };
        Reply::formatted(
            format!(
                "<b>Enter row numbers to {verb} separated by commas</b> (for example: 1, 3, 4):"
            ),
            Keyboard::SuggestionsMenu,
        )
    }

    async fn cmd_add_all(&self, caller: &CallerId) -> Reply {
        match self.store.promote_all().await {
            Ok(outcome) => {
                self.leave_suggestions_menu(caller).await;
                Reply::plain(batch_summary(&outcome), main_keyboard(true))
            }
            Err(e) => storage_failure(e, Keyboard::SuggestionsMenu),
        }
    }

    async fn cmd_delete_all(&self, caller: &CallerId) -> Reply {
        match self.store.clear_suggestions().await {
            Ok(()) => {
                self.leave_suggestions_menu(caller).await;
                Reply::plain("All suggestions deleted.", main_keyboard(true))
            }
            Err(e) => storage_failure(e, Keyboard::SuggestionsMenu),
        }
    }

    async fn cmd_edit(&self, caller: &CallerId) -> Reply {
        self.sessions
            .update(caller, |s| {
                s.menu = Some(Menu::Suggestions);
                s.flow = Flow::AwaitingEditTarget;
            })
            .await;
        Reply::formatted(
            "<b>Enter the row number to edit</b> (for example: 1):",
            Keyboard::SuggestionsMenu,
        )
    }

    async fn cmd_add_one(&self, payload: &str) -> Reply {
        let Some(entry) = parse::record(payload) else {
            return Reply::formatted(
                format!("<b>Wrong format. Use:</b> /add {RECORD_FORMAT}"),
                Keyboard::AdminMain,
            );
        };

        let infinitive = entry.infinitive.clone();
        match self.store.add_verb(entry).await {
            Ok(AddOutcome::Duplicate) => Reply::formatted(
                "<b>This word is already in the dictionary.</b>",
                Keyboard::AdminMain,
            ),
            Ok(AddOutcome::Added { promoted }) => {
                let mut text = format!("Verb {infinitive} successfully added!");
                if promoted {
                    text.push_str("\nIt was removed from the suggestion queue.");
                }
                Reply::plain(text, Keyboard::AdminMain)
            }
            Err(e) => storage_failure(e, Keyboard::AdminMain),
        }
    }

    // --- Priority 4: search fallback ---

    async fn handle_search(&self, msg: &Inbound, text: &str, is_admin: bool) -> Reply {
        if text.chars().count() < MIN_QUERY_CHARS {
            return Reply::formatted(
                "<b>Enter at least 3 characters</b> to search.",
                main_keyboard(is_admin),
            );
        }

        let verbs = self.store.verbs().await;
        let hits = search::matches(&verbs, text);
        if hits.is_empty() {
            return Reply::formatted(
                "The word was not found. <b>Use 'suggest-word'</b> to propose it.",
                main_keyboard(is_admin),
            );
        }

        let first = hits[0].infinitive.clone();
        let mut out = String::from("<b>Found matches:</b>\n");
        for hit in &hits {
            out.push_str(&format!(
                "<b>Infinitive:</b> {}\n<b>Present:</b> {}\n<b>Past:</b> {}\n\
                 <b>Past participle:</b> {}\n<b>Translation:</b> {}\n\n",
                hit.infinitive, hit.present, hit.past, hit.past_participle, hit.translation
            ));
        }
        self.sessions
            .update(&msg.caller_id, |s| s.last_searched_infinitive = Some(first))
            .await;
        Reply::formatted(out.trim_end().to_string(), main_keyboard(is_admin))
    }

    // --- helpers ---

    /// Close the suggestions menu and whatever sub-flow it owned.
    async fn leave_suggestions_menu(&self, caller: &CallerId) {
        self.sessions
            .update(caller, |s| {
                s.menu = None;
                s.flow = Flow::Idle;
            })
            .await;
    }

    /// Session snapshot, exposed for tests and diagnostics.
    pub async fn session(&self, caller: &CallerId) -> SessionState {
        self.sessions.get(caller).await
    }
}

fn main_keyboard(is_admin: bool) -> Keyboard {
    if is_admin {
        Keyboard::AdminMain
    } else {
        Keyboard::Main
    }
}

fn batch_summary(outcome: &BatchOutcome) -> String {
    let mut out = String::from("Result:");
    if !outcome.added.is_empty() {
        out.push_str(&format!("\nSuccessfully added: {}", outcome.added.join(", ")));
    }
    if !outcome.duplicates.is_empty() {
        out.push_str(&format!(
            "\nAlready in the dictionary: {}",
            outcome.duplicates.join(", ")
        ));
    }
    out
}

/// A flush failed after rollback; the flow stays open so the caller can retry.
fn storage_failure(e: StoreError, keyboard: Keyboard) -> Reply {
    warn!(error = %e, "storage failure while handling message");
    Reply::plain(
        "Something went wrong while saving. Please try again.",
        keyboard,
    )
}
