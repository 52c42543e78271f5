use crate::commands::tree::SubtreeTotals;
use crate::error::Result;
use crate::node::{ProfileNodeView, Revision};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, prelude::*, widgets::ListState};
use std::collections::HashSet;
use std::io::{self, stdout};
use std::time::Duration;

use super::ui;

/// Child indices from the root to a node
pub type NodePath = Vec<i32>;

/// One visible line of the tree
pub struct Row<'a, R: Revision> {
    pub path: NodePath,
    pub view: ProfileNodeView<'a, R>,
    pub subtree_samples: f64,
    pub expanded: bool,
}

impl<R: Revision> Row<'_, R> {
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    pub fn has_children(&self) -> bool {
        self.view.children_count() > 0
    }
}

/// Interactive call tree browser state
pub struct App<'a, R: Revision> {
    root: ProfileNodeView<'a, R>,
    title: String,
    totals: SubtreeTotals,
    total_samples: f64,
    expanded: HashSet<NodePath>,
    rows: Vec<Row<'a, R>>,
    pub(super) list_state: ListState,
    running: bool,
    page_size: usize,
}

impl<'a, R: Revision> App<'a, R> {
    pub fn new(root: ProfileNodeView<'a, R>, title: String) -> Self {
        let mut expanded = HashSet::new();
        expanded.insert(NodePath::new());

        let totals = SubtreeTotals::compute(root);
        let mut app = App {
            root,
            title,
            total_samples: totals.get(root),
            totals,
            expanded,
            rows: Vec::new(),
            list_state: ListState::default(),
            running: true,
            page_size: 20,
        };
        app.rebuild_rows();
        app.list_state.select(Some(0));
        app
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn revision_name(&self) -> &'static str {
        R::NAME
    }

    pub fn total_samples(&self) -> f64 {
        self.total_samples
    }

    pub fn rows(&self) -> &[Row<'a, R>] {
        &self.rows
    }

    pub fn selected_index(&self) -> usize {
        self.list_state.selected().unwrap_or(0)
    }

    pub fn selected(&self) -> Option<&Row<'a, R>> {
        self.rows.get(self.selected_index())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Flatten the expanded part of the tree into display rows
    fn rebuild_rows(&mut self) {
        let mut rows = Vec::new();
        let mut stack = vec![(self.root, NodePath::new())];

        while let Some((view, path)) = stack.pop() {
            let expanded = self.expanded.contains(&path);
            if expanded {
                let children: Vec<_> = (0..view.children_count())
                    .filter_map(|index| view.get_child(index).map(|child| (index, child)))
                    .collect();
                for (index, child) in children.into_iter().rev() {
                    let mut child_path = path.clone();
                    child_path.push(index);
                    stack.push((child, child_path));
                }
            }
            rows.push(Row {
                path,
                view,
                subtree_samples: self.totals.get(view),
                expanded,
            });
        }
        self.rows = rows;

        if let Some(selected) = self.list_state.selected()
            && selected >= self.rows.len()
        {
            self.list_state.select(Some(self.rows.len().saturating_sub(1)));
        }
    }

    fn select(&mut self, index: usize) {
        let last = self.rows.len().saturating_sub(1);
        self.list_state.select(Some(index.min(last)));
    }

    fn select_path(&mut self, path: &[i32]) {
        if let Some(index) = self.rows.iter().position(|r| r.path == path) {
            self.select(index);
        }
    }

    pub fn expand_selected(&mut self) {
        let Some(row) = self.selected() else {
            return;
        };
        if !row.has_children() {
            return;
        }
        if row.expanded {
            // Already open: step into the first child
            let next = self.selected_index() + 1;
            self.select(next);
        } else {
            let path = row.path.clone();
            self.expanded.insert(path);
            self.rebuild_rows();
        }
    }

    pub fn collapse_selected(&mut self) {
        let Some(row) = self.selected() else {
            return;
        };
        let path = row.path.clone();
        if row.expanded {
            self.expanded.remove(&path);
            self.rebuild_rows();
            self.select_path(&path);
        } else if let Some((_, parent)) = path.split_last() {
            let parent = parent.to_vec();
            self.select_path(&parent);
        }
    }

    pub fn toggle_selected(&mut self) {
        let Some(expanded) = self.selected().map(|row| row.expanded) else {
            return;
        };
        if expanded {
            self.collapse_selected();
        } else {
            self.expand_selected();
        }
    }

    /// Expand every node under the selection
    pub fn expand_all_selected(&mut self) {
        let Some(row) = self.selected() else {
            return;
        };
        let mut stack = vec![(row.view, row.path.clone())];
        while let Some((view, path)) = stack.pop() {
            if view.children_count() == 0 {
                continue;
            }
            for index in 0..view.children_count() {
                if let Some(child) = view.get_child(index) {
                    let mut child_path = path.clone();
                    child_path.push(index);
                    stack.push((child, child_path));
                }
            }
            self.expanded.insert(path);
        }
        self.rebuild_rows();
    }

    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        let current = self.selected_index();

        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('c') if ctrl => self.running = false,

            KeyCode::Down | KeyCode::Char('j') => self.select(current + 1),
            KeyCode::Up | KeyCode::Char('k') => self.select(current.saturating_sub(1)),
            KeyCode::Char('d') if ctrl => self.select(current + self.page_size / 2),
            KeyCode::Char('u') if ctrl => self.select(current.saturating_sub(self.page_size / 2)),
            KeyCode::PageDown => self.select(current + self.page_size),
            KeyCode::PageUp => self.select(current.saturating_sub(self.page_size)),
            KeyCode::Char('g') | KeyCode::Home => self.select(0),
            KeyCode::Char('G') | KeyCode::End => self.select(self.rows.len()),

            KeyCode::Right | KeyCode::Char('l') | KeyCode::Enter => self.expand_selected(),
            KeyCode::Left | KeyCode::Char('h') => self.collapse_selected(),
            KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('e') => self.expand_all_selected(),
            _ => {}
        }
    }

    pub fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        let mut needs_redraw = true;
        while self.running {
            if needs_redraw {
                terminal.draw(|frame| {
                    self.page_size = usize::from(frame.area().height.saturating_sub(4)).max(1);
                    ui::render(frame, self);
                })?;
                needs_redraw = false;
            }

            if event::poll(Duration::from_millis(100))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key.code, key.modifiers);
                        needs_redraw = true;
                    }
                    Event::Resize(..) => needs_redraw = true,
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{CapturedNode, CpuProfile};
    use crate::node::{Legacy, Sampled};

    fn profile() -> CpuProfile {
        let root = CapturedNode::new("(root)", "", 0)
            .with_child(
                CapturedNode::new("main", "app.js", 1)
                    .with_hits(1)
                    .with_child(CapturedNode::new("work", "app.js", 5).with_hits(4)),
            )
            .with_child(CapturedNode::new("(idle)", "", 0).with_hits(5));
        CpuProfile::from_root(root, 0.0, 10_000.0)
    }

    fn names<'a, R: Revision>(app: &App<'a, R>) -> Vec<&'a str> {
        app.rows().iter().map(|r| r.view.function_name()).collect()
    }

    #[test]
    fn test_initial_rows_show_root_children() {
        let profile = profile();
        let app = App::new(profile.root_view::<Sampled>(), "p".to_string());
        assert_eq!(names(&app), ["(root)", "main", "(idle)"]);
        assert_eq!(app.total_samples(), 10.0);
        assert_eq!(app.rows()[1].subtree_samples, 5.0);
        assert_eq!(app.rows()[2].subtree_samples, 5.0);
        assert_eq!(app.selected_index(), 0);
    }

    #[test]
    fn test_expand_and_collapse() {
        let profile = profile();
        let mut app = App::new(profile.root_view::<Legacy>(), "p".to_string());

        app.handle_key(KeyCode::Down, KeyModifiers::NONE);
        app.handle_key(KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(names(&app), ["(root)", "main", "work", "(idle)"]);
        assert_eq!(app.selected().unwrap().view.function_name(), "main");

        // second Right steps into the child
        app.handle_key(KeyCode::Right, KeyModifiers::NONE);
        assert_eq!(app.selected().unwrap().path, vec![0, 0]);
        assert_eq!(app.selected().unwrap().depth(), 2);

        // Left on a leaf jumps to the parent, then collapses it
        app.handle_key(KeyCode::Left, KeyModifiers::NONE);
        assert_eq!(app.selected().unwrap().view.function_name(), "main");
        app.handle_key(KeyCode::Left, KeyModifiers::NONE);
        assert_eq!(names(&app), ["(root)", "main", "(idle)"]);
        assert_eq!(app.selected().unwrap().view.function_name(), "main");
    }

    #[test]
    fn test_selection_is_clamped() {
        let profile = profile();
        let mut app = App::new(profile.root_view::<Sampled>(), "p".to_string());
        app.handle_key(KeyCode::Char('G'), KeyModifiers::NONE);
        assert_eq!(app.selected_index(), 2);
        app.handle_key(KeyCode::Down, KeyModifiers::NONE);
        assert_eq!(app.selected_index(), 2);
        app.handle_key(KeyCode::Char('g'), KeyModifiers::NONE);
        app.handle_key(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(app.selected_index(), 0);
    }

    #[test]
    fn test_expand_all_and_quit() {
        let profile = profile();
        let mut app = App::new(profile.root_view::<Sampled>(), "p".to_string());
        app.handle_key(KeyCode::Char('e'), KeyModifiers::NONE);
        assert_eq!(app.rows().len(), 4);
        app.handle_key(KeyCode::Char('q'), KeyModifiers::NONE);
        assert!(!app.is_running());
    }
}
