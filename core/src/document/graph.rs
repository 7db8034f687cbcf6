//! Line dependency graph.
//!
//! Lines are nodes; an edge goes from a line to every line declaring a
//! variable it mentions. The graph must be acyclic, and evaluation follows a
//! topological order of it.

use super::token::TokenKind;
use super::types::Document;

/// Depth-first search recording discovery and finish times. A node that has
/// been discovered but not finished is on the current path, so reaching it
/// again closes a cycle.
///
/// The search keeps its own stack of `(line, next dependency)` frames, so a
/// long chain of references cannot exhaust the thread's stack.
struct CycleSearch<'a> {
    document: &'a Document,
    discovery: Vec<usize>,
    finish: Vec<usize>,
    clock: usize,
}

impl<'a> CycleSearch<'a> {
    fn new(document: &'a Document) -> Self {
        let count = document.lines.len();
        Self {
            document,
            discovery: vec![0; count],
            finish: vec![0; count],
            clock: 1,
        }
    }

    fn tick(&mut self) -> usize {
        let time = self.clock;
        self.clock += 1;
        time
    }

    fn visit(&mut self, root: usize) -> Option<(usize, usize)> {
        let document = self.document;
        self.discovery[root] = self.tick();
        let mut stack = vec![(root, 0)];

        while let Some((node, next_index)) = stack.last_mut() {
            let node = *node;

            match document.lines[node].dependencies.get(*next_index) {
                Some(&next) => {
                    *next_index += 1;
                    if self.discovery[next] == 0 {
                        self.discovery[next] = self.tick();
                        stack.push((next, 0));
                    } else if self.finish[next] == 0 {
                        return Some((node, next));
                    }
                }
                None => {
                    self.finish[node] = self.tick();
                    stack.pop();
                }
            }
        }
        None
    }
}

impl Document {
    /// Register `name :` prefixes and strip them from the semantic tokens.
    pub(crate) fn resolve_declarations(&mut self) {
        self.variables.clear();

        for (index, line) in self.lines.iter_mut().enumerate() {
            let declares = line.tokens.len() >= 2
                && line.tokens[0].kind == TokenKind::Literal
                && line.tokens[1].kind == TokenKind::Definition;

            if declares {
                let name = line.tokens[0].text.clone();
                line.tokens.drain(..2);
                self.variables.insert(name.clone(), index);
                line.name = Some(name);
            }
        }
    }

    /// Record, for every line, the lines declaring the names it mentions.
    pub(crate) fn build_dependencies(&mut self) {
        let variables = &self.variables;

        for line in &mut self.lines {
            line.dependencies = line
                .tokens
                .iter()
                .filter(|t| t.kind == TokenKind::Literal)
                .filter_map(|t| variables.get(&t.text).copied())
                .collect();
        }
    }

    /// Find a reference cycle, returned as the edge `(line, depends_on)` that
    /// closes it.
    pub fn find_cycle(&self) -> Option<(usize, usize)> {
        let mut search = CycleSearch::new(self);

        for node in 0..self.lines.len() {
            if search.discovery[node] == 0 {
                if let Some(cycle) = search.visit(node) {
                    return Some(cycle);
                }
            }
        }
        None
    }

    /// Compute the execution order: a post-order depth-first visit, so every
    /// line comes after the lines it depends on. The graph must be acyclic.
    pub(crate) fn schedule(&mut self) {
        let mut visited = vec![false; self.lines.len()];
        let mut order = Vec::with_capacity(self.lines.len());

        for node in 0..self.lines.len() {
            if !visited[node] {
                self.visit_post_order(node, &mut visited, &mut order);
            }
        }

        self.execution_order = order;
    }

    fn visit_post_order(&self, root: usize, visited: &mut [bool], order: &mut Vec<usize>) {
        visited[root] = true;
        let mut stack = vec![(root, 0)];

        while let Some((node, next_index)) = stack.last_mut() {
            let node = *node;

            match self.lines[node].dependencies.get(*next_index) {
                Some(&next) => {
                    *next_index += 1;
                    if !visited[next] {
                        visited[next] = true;
                        stack.push((next, 0));
                    }
                }
                None => {
                    order.push(node);
                    stack.pop();
                }
            }
        }
    }
}
