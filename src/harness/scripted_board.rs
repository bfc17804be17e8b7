//! In-memory stand-in for the game page.
//!
//! `ScriptedBoard` implements `UiDriver` over a flat element list kept in
//! document order. It can be used as a static fixture (add elements by hand)
//! or as a small game simulation: `ScriptedBoard::game` lays out a board, a
//! clock and a promotion window, and after each of our moves it plays the next
//! scripted opponent reply by moving highlights and piece elements and
//! toggling the turn marker, the way the real page does.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::board::bridge_types::{EngineSquare, Side};
use crate::board::coordinate_mapper::engine_index_to_ui_identifier;
use crate::bridge_errors::{BridgeError, BridgeResult};
use crate::session::config::{AutomationFactory, Credentials};
use crate::ui::ui_driver::{Selector, UiDriver};
use crate::ui::ui_vocabulary::UiVocabulary;

/// Handle to an element of a `ScriptedBoard`. Stays valid after removal;
/// lookups through it then fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptedElementId(usize);

#[derive(Debug, Clone)]
struct ScriptedElement {
    classes: Vec<String>,
    id: Option<String>,
    text: String,
    parent: Option<ScriptedElementId>,
    live: bool,
}

/// One recorded click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickRecord {
    pub classes: String,
    /// `Some` for `click_at_offset`.
    pub offset: Option<(i32, i32)>,
}

/// A move completed on the page by our side, as square tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedMove {
    pub from: String,
    pub to: String,
    pub promotion_token: Option<String>,
}

/// Observable history of a scripted board, shared with the test that built it.
#[derive(Debug, Clone, Default)]
pub struct BoardTranscript {
    pub clicks: Vec<ClickRecord>,
    pub own_moves: Vec<CompletedMove>,
    pub opponent_moves_played: usize,
    pub quit: bool,
}

/// Opponent move in engine indices plus an optional promotion letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedReply {
    pub from: EngineSquare,
    pub to: EngineSquare,
    pub promotion: Option<char>,
}

impl ScriptedReply {
    pub const fn quiet(from: EngineSquare, to: EngineSquare) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }
}

/// In-memory page implementing `UiDriver`.
#[derive(Debug)]
pub struct ScriptedBoard {
    elements: Vec<ScriptedElement>,
    css_index: HashMap<String, Vec<ScriptedElementId>>,
    vocabulary: UiVocabulary,
    layout: Option<GameLayout>,
    transcript: Arc<Mutex<BoardTranscript>>,
}

#[derive(Debug)]
struct GameLayout {
    own_side: Side,
    board: ScriptedElementId,
    clock: ScriptedElementId,
    replies: VecDeque<ScriptedReply>,
    selected: Option<String>,
}

impl Default for ScriptedBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedBoard {
    /// Empty page, for hand-built fixtures.
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            css_index: HashMap::new(),
            vocabulary: UiVocabulary::default(),
            layout: None,
            transcript: Arc::new(Mutex::new(BoardTranscript::default())),
        }
    }

    /// A playable page. When `own_side` is the second player the first reply
    /// is played immediately, as if the opponent had opened.
    pub fn game(own_side: Side, clock_text: &str, replies: Vec<ScriptedReply>) -> Self {
        let mut page = Self::new();
        let vocabulary = page.vocabulary.clone();

        let mut board_classes = vocabulary.board_class.clone();
        if own_side == Side::SecondPlayer {
            board_classes.push(' ');
            board_classes.push_str(&vocabulary.flipped_marker);
        }
        let board = page.add_element(&board_classes, "");
        for index in 0..64u8 {
            let token = page.square_token(index);
            page.add_child(board, &format!("board-square {token}"), "");
        }

        let window = page.add_child(board, &vocabulary.promotion_window_class, "");
        for token in ["wq", "wr", "wb", "wn", "bq", "br", "bb", "bn"] {
            page.add_child(window, &format!("promotion-piece {token}"), "");
        }

        let clock = page.add_element(&vocabulary.clock_class, "");
        let clock_span = page.add_child(clock, "clock-time-monospace", clock_text);
        page.register_css(&vocabulary.clock_text_css, clock_span);

        page.layout = Some(GameLayout {
            own_side,
            board,
            clock,
            replies: replies.into(),
            selected: None,
        });

        match own_side {
            Side::FirstPlayer => page.set_turn_marker(true),
            Side::SecondPlayer => page.play_next_reply(),
        }
        page
    }

    /// Shared handle on what happened to the page, readable after the
    /// board has been moved into a session.
    pub fn transcript(&self) -> Arc<Mutex<BoardTranscript>> {
        Arc::clone(&self.transcript)
    }

    /// Append a top-level element with space-separated `classes`.
    pub fn add_element(&mut self, classes: &str, text: &str) -> ScriptedElementId {
        self.push_element(classes, text, None)
    }

    /// Append an element inside `parent`, after everything added so far.
    pub fn add_child(
        &mut self,
        parent: ScriptedElementId,
        classes: &str,
        text: &str,
    ) -> ScriptedElementId {
        self.push_element(classes, text, Some(parent))
    }

    /// Make the element reachable through `Selector::id`.
    pub fn set_id(&mut self, element: ScriptedElementId, id: &str) {
        self.elements[element.0].id = Some(id.to_owned());
    }

    /// Answer the CSS `query` with `element`. Only registered queries match.
    pub fn register_css(&mut self, query: &str, element: ScriptedElementId) {
        self.css_index
            .entry(query.to_owned())
            .or_default()
            .push(element);
    }

    /// Replace the element's class list.
    pub fn set_classes(&mut self, element: ScriptedElementId, classes: &str) {
        self.elements[element.0].classes = split_classes(classes);
    }

    /// Replace the element's text.
    pub fn set_text(&mut self, element: ScriptedElementId, text: &str) {
        self.elements[element.0].text = text.to_owned();
    }

    /// Detach the element. Later lookups skip it and calls through its
    /// handle report `ElementNotFound`.
    pub fn remove(&mut self, element: ScriptedElementId) {
        self.elements[element.0].live = false;
    }

    /// Update the own clock text of a `game` page, as the real clock would
    /// while the game runs.
    pub fn set_clock_text(&mut self, text: &str) {
        let query = self.vocabulary.clock_text_css.clone();
        if let Some(ids) = self.css_index.get(&query).cloned() {
            for id in ids {
                self.set_text(id, text);
            }
        }
    }

    fn push_element(
        &mut self,
        classes: &str,
        text: &str,
        parent: Option<ScriptedElementId>,
    ) -> ScriptedElementId {
        self.elements.push(ScriptedElement {
            classes: split_classes(classes),
            id: None,
            text: text.to_owned(),
            parent,
            live: true,
        });
        ScriptedElementId(self.elements.len() - 1)
    }

    fn square_token(&self, index: EngineSquare) -> String {
        // Indices produced here are always in range.
        engine_index_to_ui_identifier(index, &self.vocabulary.square_prefix)
            .unwrap_or_else(|_| format!("{}00", self.vocabulary.square_prefix))
    }

    fn matches(&self, element: &ScriptedElement, selector: &Selector) -> bool {
        match selector {
            Selector::ClassName(name) => element.classes.iter().any(|c| c == name),
            Selector::Id(id) => element.id.as_deref() == Some(id.as_str()),
            Selector::Css(_) => false,
        }
    }

    fn matching(&self, selector: &Selector) -> Vec<ScriptedElementId> {
        if let Selector::Css(query) = selector {
            return self
                .css_index
                .get(query)
                .map(|ids| {
                    ids.iter()
                        .copied()
                        .filter(|id| self.elements[id.0].live)
                        .collect()
                })
                .unwrap_or_default();
        }
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.live && self.matches(element, selector))
            .map(|(index, _)| ScriptedElementId(index))
            .collect()
    }

    fn is_descendant(&self, element: ScriptedElementId, ancestor: ScriptedElementId) -> bool {
        let mut current = self.elements[element.0].parent;
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.elements[parent.0].parent;
        }
        false
    }

    fn checked(&self, element: &ScriptedElementId) -> BridgeResult<&ScriptedElement> {
        self.elements
            .get(element.0)
            .filter(|e| e.live)
            .ok_or_else(|| BridgeError::element_not_found(format!("{element:?} (detached)")))
    }

    fn ensure_open(&self) -> BridgeResult<()> {
        if self.lock_transcript().quit {
            return Err(BridgeError::Automation("session already quit".to_owned()));
        }
        Ok(())
    }

    fn lock_transcript(&self) -> std::sync::MutexGuard<'_, BoardTranscript> {
        self.transcript
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_turn_marker(&mut self, on_move: bool) {
        let Some(clock) = self.layout.as_ref().map(|layout| layout.clock) else {
            return;
        };
        let marker = self.vocabulary.turn_marker.clone();
        let classes = &mut self.elements[clock.0].classes;
        classes.retain(|c| *c != marker);
        if on_move {
            classes.push(marker);
        }
    }

    fn clear_highlights(&mut self) {
        let highlight = self.vocabulary.highlight_class.clone();
        for element in &mut self.elements {
            if element.classes.iter().any(|c| *c == highlight) {
                element.live = false;
            }
        }
    }

    fn remove_pieces_on(&mut self, square: &str) {
        let piece = self.vocabulary.piece_class.clone();
        for element in &mut self.elements {
            if element.classes.iter().any(|c| *c == piece)
                && element.classes.iter().any(|c| c == square)
            {
                element.live = false;
            }
        }
    }

    fn move_piece(&mut self, from: &str, to: &str, color: char, promotion: Option<char>) {
        let Some(board) = self.layout.as_ref().map(|layout| layout.board) else {
            return;
        };
        self.remove_pieces_on(from);
        self.remove_pieces_on(to);
        let classes = match promotion {
            Some(letter) => format!("{} {to} {color}{letter}", self.vocabulary.piece_class),
            None => format!("{} {color}p {to}", self.vocabulary.piece_class),
        };
        self.add_child(board, &classes, "");

        self.clear_highlights();
        let highlight = self.vocabulary.highlight_class.clone();
        self.add_child(board, &format!("{highlight} {from}"), "");
        self.add_child(board, &format!("{highlight} {to}"), "");
    }

    fn play_next_reply(&mut self) {
        let Some(layout) = self.layout.as_mut() else {
            return;
        };
        let color = layout.own_side.opposite().piece_prefix();
        let Some(reply) = layout.replies.pop_front() else {
            return;
        };
        let from = self.square_token(reply.from);
        let to = self.square_token(reply.to);
        self.move_piece(&from, &to, color, reply.promotion);
        self.lock_transcript().opponent_moves_played += 1;
        self.set_turn_marker(true);
    }

    fn square_of(&self, element: ScriptedElementId) -> Option<String> {
        let prefix = &self.vocabulary.square_prefix;
        self.elements[element.0]
            .classes
            .iter()
            .find(|c| c.starts_with(prefix.as_str()))
            .cloned()
    }

    fn on_click(&mut self, element: ScriptedElementId, centered: bool) {
        let Some(own_color) = self.layout.as_ref().map(|l| l.own_side.piece_prefix()) else {
            return;
        };

        let promotion_piece = self.elements[element.0]
            .classes
            .iter()
            .any(|c| c == "promotion-piece");
        if promotion_piece {
            let token = self.elements[element.0].classes.last().cloned();
            let last_to = {
                let mut transcript = self.lock_transcript();
                transcript.own_moves.last_mut().map(|mv| {
                    mv.promotion_token = token.clone();
                    mv.to.clone()
                })
            };
            if let (Some(to), Some(token)) = (last_to, token) {
                self.remove_pieces_on(&to);
                if let Some(board) = self.layout.as_ref().map(|l| l.board) {
                    let classes = format!("{} {to} {token}", self.vocabulary.piece_class);
                    self.add_child(board, &classes, "");
                }
            }
            return;
        }

        let Some(square) = self.square_of(element) else {
            return;
        };
        let selected = self.layout.as_mut().and_then(|l| l.selected.take());
        match selected {
            Some(from) if centered => {
                self.move_piece(&from, &square, own_color, None);
                self.lock_transcript().own_moves.push(CompletedMove {
                    from,
                    to: square,
                    promotion_token: None,
                });
                self.set_turn_marker(false);
                self.play_next_reply();
            }
            _ => {
                if let Some(layout) = self.layout.as_mut() {
                    layout.selected = Some(square);
                }
            }
        }
    }
}

fn split_classes(classes: &str) -> Vec<String> {
    classes.split_whitespace().map(str::to_owned).collect()
}

impl UiDriver for ScriptedBoard {
    type Element = ScriptedElementId;

    fn find_element(&mut self, selector: &Selector) -> BridgeResult<Self::Element> {
        self.ensure_open()?;
        self.matching(selector)
            .into_iter()
            .next()
            .ok_or_else(|| BridgeError::element_not_found(selector))
    }

    fn find_elements(&mut self, selector: &Selector) -> BridgeResult<Vec<Self::Element>> {
        self.ensure_open()?;
        Ok(self.matching(selector))
    }

    fn find_element_in(
        &mut self,
        parent: &Self::Element,
        selector: &Selector,
    ) -> BridgeResult<Self::Element> {
        self.ensure_open()?;
        self.checked(parent)?;
        self.matching(selector)
            .into_iter()
            .find(|id| self.is_descendant(*id, *parent))
            .ok_or_else(|| BridgeError::element_not_found(format!("{selector} in {parent:?}")))
    }

    fn attribute(&mut self, element: &Self::Element, name: &str) -> BridgeResult<String> {
        self.ensure_open()?;
        let element = self.checked(element)?;
        Ok(match name {
            "class" => element.classes.join(" "),
            "id" => element.id.clone().unwrap_or_default(),
            "innerHTML" => element.text.clone(),
            _ => String::new(),
        })
    }

    fn click(&mut self, element: &Self::Element) -> BridgeResult<()> {
        self.ensure_open()?;
        let classes = self.checked(element)?.classes.join(" ");
        self.lock_transcript().clicks.push(ClickRecord {
            classes,
            offset: None,
        });
        self.on_click(*element, false);
        Ok(())
    }

    fn click_at_offset(&mut self, element: &Self::Element, dx: i32, dy: i32) -> BridgeResult<()> {
        self.ensure_open()?;
        let classes = self.checked(element)?.classes.join(" ");
        self.lock_transcript().clicks.push(ClickRecord {
            classes,
            offset: Some((dx, dy)),
        });
        self.on_click(*element, true);
        Ok(())
    }

    fn read_text(&mut self, element: &Self::Element) -> BridgeResult<String> {
        self.ensure_open()?;
        Ok(self.checked(element)?.text.clone())
    }

    fn quit(&mut self) -> BridgeResult<()> {
        self.lock_transcript().quit = true;
        Ok(())
    }
}

/// Hands out one prepared `ScriptedBoard`, ignoring credentials.
#[derive(Debug)]
pub struct ScriptedAutomation {
    board: Option<ScriptedBoard>,
}

impl ScriptedAutomation {
    /// Factory whose single `launch` yields `board`.
    pub fn new(board: ScriptedBoard) -> Self {
        Self { board: Some(board) }
    }
}

impl AutomationFactory for ScriptedAutomation {
    type Driver = ScriptedBoard;

    fn launch(&mut self, _credentials: &Credentials) -> BridgeResult<Self::Driver> {
        self.board
            .take()
            .ok_or_else(|| BridgeError::Automation("scripted board already launched".to_owned()))
    }
}
