// Copyright (c) The gherkin-junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Structural model of a parsed Gherkin source file.
//!
//! A source file parses into a tree of named nodes: a feature contains
//! rules, scenarios and scenario outlines; an outline contains examples
//! blocks, which in turn contain example rows. A node is linked to an
//! executed [`TestCase`](crate::TestCase) by its [`Location`]:
//! [`find_path_to`] resolves the path from a root node down to the node
//! with the same location as the test case.

use std::collections::VecDeque;

/// A position in a source file.
///
/// The only operation path resolution needs is equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

impl Location {
    /// Creates a new `Location`.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// A node in a source file.
///
/// This is a closed set of variants: `Feature`, `Rule`, `ScenarioOutline`
/// and `Examples` are containers with an ordered child list constrained to
/// the kinds of node they may hold; `Scenario` and `Example` are leaves.
/// Trees are finite and acyclic, and every non-root node has exactly one
/// parent.
#[derive(Clone, Debug)]
pub enum Node {
    /// A feature. Holds rules, scenarios and scenario outlines.
    Feature(Feature),
    /// A rule. Holds scenarios and scenario outlines.
    Rule(Rule),
    /// A scenario.
    Scenario(Scenario),
    /// A scenario outline. Holds examples blocks.
    ScenarioOutline(ScenarioOutline),
    /// An examples block. Holds example rows.
    Examples(Examples),
    /// A single example row.
    Example(Example),
}

/// A feature has a keyword and optionally a name.
#[derive(Clone, Debug)]
pub struct Feature {
    pub location: Location,
    pub keyword: Option<String>,
    pub name: Option<String>,
    pub children: Vec<Node>,
}

/// A rule has a keyword and optionally a name.
#[derive(Clone, Debug)]
pub struct Rule {
    pub location: Location,
    pub keyword: Option<String>,
    pub name: Option<String>,
    pub children: Vec<Node>,
}

/// A scenario has a keyword and optionally a name.
#[derive(Clone, Debug)]
pub struct Scenario {
    pub location: Location,
    pub keyword: Option<String>,
    pub name: Option<String>,
}

/// A scenario outline has a keyword and optionally a name.
#[derive(Clone, Debug)]
pub struct ScenarioOutline {
    pub location: Location,
    pub keyword: Option<String>,
    pub name: Option<String>,
    pub examples: Vec<Examples>,
}

/// An examples block has a keyword and optionally a name.
#[derive(Clone, Debug)]
pub struct Examples {
    pub location: Location,
    pub keyword: Option<String>,
    pub name: Option<String>,
    pub examples: Vec<Example>,
}

/// An example row has no keyword but always a name.
#[derive(Clone, Debug)]
pub struct Example {
    pub location: Location,
    pub name: Option<String>,
}

/// A borrowed view over any node in a source tree.
///
/// Resolved paths are expressed as sequences of `NodeRef`s so that a path
/// can span heterogeneous variants without cloning the tree.
#[derive(Clone, Copy, Debug)]
pub enum NodeRef<'a> {
    Feature(&'a Feature),
    Rule(&'a Rule),
    Scenario(&'a Scenario),
    ScenarioOutline(&'a ScenarioOutline),
    Examples(&'a Examples),
    Example(&'a Example),
}

impl<'a> NodeRef<'a> {
    /// The location of this node.
    pub fn location(self) -> Location {
        match self {
            NodeRef::Feature(node) => node.location,
            NodeRef::Rule(node) => node.location,
            NodeRef::Scenario(node) => node.location,
            NodeRef::ScenarioOutline(node) => node.location,
            NodeRef::Examples(node) => node.location,
            NodeRef::Example(node) => node.location,
        }
    }

    /// The keyword of this node, if any. Example rows never have one.
    pub fn keyword(self) -> Option<&'a str> {
        match self {
            NodeRef::Feature(node) => node.keyword.as_deref(),
            NodeRef::Rule(node) => node.keyword.as_deref(),
            NodeRef::Scenario(node) => node.keyword.as_deref(),
            NodeRef::ScenarioOutline(node) => node.keyword.as_deref(),
            NodeRef::Examples(node) => node.keyword.as_deref(),
            NodeRef::Example(_) => None,
        }
    }

    /// The name of this node, if any.
    pub fn name(self) -> Option<&'a str> {
        match self {
            NodeRef::Feature(node) => node.name.as_deref(),
            NodeRef::Rule(node) => node.name.as_deref(),
            NodeRef::Scenario(node) => node.name.as_deref(),
            NodeRef::ScenarioOutline(node) => node.name.as_deref(),
            NodeRef::Examples(node) => node.name.as_deref(),
            NodeRef::Example(node) => node.name.as_deref(),
        }
    }

    /// The children of this node in source order, or `None` for leaves.
    fn children(self) -> Option<VecDeque<NodeRef<'a>>> {
        match self {
            NodeRef::Feature(node) => Some(node.children.iter().map(NodeRef::from).collect()),
            NodeRef::Rule(node) => Some(node.children.iter().map(NodeRef::from).collect()),
            NodeRef::ScenarioOutline(node) => {
                Some(node.examples.iter().map(NodeRef::Examples).collect())
            }
            NodeRef::Examples(node) => Some(node.examples.iter().map(NodeRef::Example).collect()),
            NodeRef::Scenario(_) | NodeRef::Example(_) => None,
        }
    }
}

impl<'a> From<&'a Node> for NodeRef<'a> {
    fn from(node: &'a Node) -> Self {
        match node {
            Node::Feature(node) => NodeRef::Feature(node),
            Node::Rule(node) => NodeRef::Rule(node),
            Node::Scenario(node) => NodeRef::Scenario(node),
            Node::ScenarioOutline(node) => NodeRef::ScenarioOutline(node),
            Node::Examples(node) => NodeRef::Examples(node),
            Node::Example(node) => NodeRef::Example(node),
        }
    }
}

/// Finds the path from one of `roots` down to the first node matching
/// `predicate`, or `None` if no node matches.
///
/// Nodes are visited depth first in pre-order, siblings left to right, and
/// the search stops at the first match. The traversal keeps its own stack
/// of sibling groups rather than recursing, so arbitrarily deep trees
/// cannot overflow the native call stack. Runs in O(nodes) time with
/// O(depth) extra memory.
pub fn find_path_to<'a, P>(roots: &'a [Node], predicate: P) -> Option<Vec<NodeRef<'a>>>
where
    P: Fn(NodeRef<'a>) -> bool,
{
    let mut path: Vec<NodeRef<'a>> = Vec::new();
    let mut to_search: Vec<VecDeque<NodeRef<'a>>> = Vec::new();
    to_search.push(roots.iter().map(NodeRef::from).collect());

    while let Some(candidates) = to_search.last_mut() {
        let Some(candidate) = candidates.pop_front() else {
            // Sibling group exhausted without a match: backtrack.
            path.pop();
            to_search.pop();
            continue;
        };
        if predicate(candidate) {
            path.push(candidate);
            return Some(path);
        }
        if let Some(children) = candidate.children() {
            path.push(candidate);
            to_search.push(children);
        }
    }
    None
}

/// Maps each node variant into a value of the target structure.
///
/// Used with [`map_tree`]; each visit method receives the node and the
/// mapped value of its parent (the seed value for the root).
pub trait NodeVisitor<T> {
    fn visit_feature(&mut self, feature: &Feature, parent: &T) -> T;
    fn visit_rule(&mut self, rule: &Rule, parent: &T) -> T;
    fn visit_scenario(&mut self, scenario: &Scenario, parent: &T) -> T;
    fn visit_scenario_outline(&mut self, outline: &ScenarioOutline, parent: &T) -> T;
    fn visit_examples(&mut self, examples: &Examples, parent: &T) -> T;
    fn visit_example(&mut self, example: &Example, parent: &T) -> T;
}

/// Maps a whole tree into another tree-like structure and returns the
/// mapped root.
///
/// Nodes are visited in pre-order, each container before its children and
/// siblings left to right. Like [`find_path_to`], the traversal is
/// iterative so that source depth cannot overflow the native call stack;
/// mapped parent values are kept in an arena that children index into.
pub fn map_tree<'a, T, V>(root: NodeRef<'a>, seed: T, visitor: &mut V) -> T
where
    V: NodeVisitor<T>,
{
    let mut mapped: Vec<T> = vec![seed];
    let mut stack: Vec<(NodeRef<'a>, usize)> = vec![(root, 0)];

    while let Some((node, parent_index)) = stack.pop() {
        let parent = &mapped[parent_index];
        let value = match node {
            NodeRef::Feature(feature) => visitor.visit_feature(feature, parent),
            NodeRef::Rule(rule) => visitor.visit_rule(rule, parent),
            NodeRef::Scenario(scenario) => visitor.visit_scenario(scenario, parent),
            NodeRef::ScenarioOutline(outline) => visitor.visit_scenario_outline(outline, parent),
            NodeRef::Examples(examples) => visitor.visit_examples(examples, parent),
            NodeRef::Example(example) => visitor.visit_example(example, parent),
        };
        let index = mapped.len();
        mapped.push(value);
        if let Some(children) = node.children() {
            // LIFO stack: push right to left so children are visited left
            // to right.
            for child in children.into_iter().rev() {
                stack.push((child, index));
            }
        }
    }

    // The root's mapped value lands at index 1, right after the seed.
    mapped.swap_remove(1)
}
