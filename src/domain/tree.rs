//! Assembly of the flat element lists into a nested outline.
//!
//! The parser produces sub-budgets, titles and line items as flat lists whose
//! members refer to their parent by code. [`BudgetTree`] turns them into a
//! forest: an index from code to node is built once, every reference is
//! resolved through it, and from then on nodes refer to each other by
//! [`NodeId`] only.

use std::collections::{HashMap, HashSet, hash_map::Entry};

use thiserror::Error;
use tracing::instrument;

use crate::domain::{
    Code,
    budget::{LineItem, ParsedDocument, SubBudget, Title},
};

/// Identifier of a node within one [`BudgetTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the tree's node table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// The parsed element a node stands for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Element<'doc> {
    /// A sub-budget grouping root-level titles.
    SubBudget(&'doc SubBudget),
    /// An organizational title.
    Title(&'doc Title),
    /// A priced line item.
    LineItem(&'doc LineItem),
}

impl<'doc> Element<'doc> {
    /// The code shown for this element.
    #[must_use]
    pub fn code(&self) -> String {
        match self {
            Self::SubBudget(sub_budget) => sub_budget.code.clone(),
            Self::Title(title) => title.code.to_string(),
            Self::LineItem(item) => item.code.to_string(),
        }
    }

    /// Name of a sub-budget or title, description of a line item.
    #[must_use]
    pub fn label(&self) -> &'doc str {
        match self {
            Self::SubBudget(sub_budget) => sub_budget.name.as_str(),
            Self::Title(title) => title.name.as_str(),
            Self::LineItem(item) => item.description.as_str(),
        }
    }

    const fn position(&self) -> usize {
        match self {
            Self::SubBudget(sub_budget) => sub_budget.position,
            Self::Title(title) => title.position,
            Self::LineItem(item) => item.position,
        }
    }

    const fn kind(&self) -> Kind {
        match self {
            Self::SubBudget(_) => Kind::SubBudget,
            Self::Title(_) => Kind::Title,
            Self::LineItem(_) => Kind::LineItem,
        }
    }
}

/// Codes of different element kinds live in separate namespaces: a line item
/// is never a parent, so `01` the title and `01` the untitled item never
/// compete for the same lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Kind {
    SubBudget,
    Title,
    LineItem,
}

/// A node of the assembled outline.
#[derive(Debug, Clone)]
pub struct Node<'doc> {
    element: Element<'doc>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl<'doc> Node<'doc> {
    /// The element this node stands for.
    #[must_use]
    pub const fn element(&self) -> Element<'doc> {
        self.element
    }

    /// The enclosing node, `None` for roots.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in declaration order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Errors raised while assembling the outline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
    /// Two siblings carry the same code.
    #[error("duplicate code {code}: '{first}' and '{second}'")]
    DuplicateCode {
        /// The code both elements carry.
        code: String,
        /// Label of the element declared first.
        first: String,
        /// Label of the conflicting element.
        second: String,
    },
    /// An element refers to a parent that is not in the document.
    #[error("{code} refers to parent {parent}, which does not exist")]
    UnresolvedParent {
        /// Code of the orphaned element.
        code: String,
        /// The parent code that could not be found.
        parent: String,
    },
    /// Elements name each other as parents, so none of them hangs from a
    /// root.
    #[error("parent cycle among {}", .codes.join(", "))]
    ParentCycle {
        /// Codes of the elements that cannot be reached from a root, in
        /// declaration order.
        codes: Vec<String>,
    },
}

/// The nested, read-only outline of a budget.
///
/// Sub-budgets, level 1 titles without a sub-budget and untitled line items
/// without a sub-budget are roots. Every other element hangs from its title
/// (or, for level 1 titles and untitled items, from its sub-budget).
#[derive(Debug, Clone, Default)]
pub struct BudgetTree<'doc> {
    nodes: Vec<Node<'doc>>,
    roots: Vec<NodeId>,
}

impl<'doc> BudgetTree<'doc> {
    /// Assembles the outline of a parsed document.
    ///
    /// # Errors
    ///
    /// See [`BudgetTree::from_parts`].
    #[instrument(level = "debug", skip_all, fields(budget = %document.budget.code))]
    pub fn assemble(document: &'doc ParsedDocument) -> Result<Self, AssemblyError> {
        Self::from_parts(
            &document.sub_budgets,
            &document.titles,
            &document.line_items,
        )
    }

    /// Assembles the outline from flat element lists.
    ///
    /// Children keep the declaration order given by each element's
    /// `position`.
    ///
    /// Codes must be unique among siblings of the same kind: a line item and
    /// a title may both be `01.01` under title `01`, since a line item is
    /// never looked up as a parent.
    ///
    /// # Errors
    ///
    /// - [`AssemblyError::DuplicateCode`] if two siblings share a code, or two
    ///   titles or sub-budgets share a code anywhere (which would make parent
    ///   lookups ambiguous).
    /// - [`AssemblyError::UnresolvedParent`] if an element refers to a parent
    ///   title or sub-budget that is not present.
    /// - [`AssemblyError::ParentCycle`] if titles name each other as parents.
    pub fn from_parts(
        sub_budgets: &'doc [SubBudget],
        titles: &'doc [Title],
        line_items: &'doc [LineItem],
    ) -> Result<Self, AssemblyError> {
        let mut elements: Vec<Element<'doc>> =
            Vec::with_capacity(sub_budgets.len() + titles.len() + line_items.len());
        elements.extend(sub_budgets.iter().map(Element::SubBudget));
        elements.extend(titles.iter().map(Element::Title));
        elements.extend(line_items.iter().map(Element::LineItem));
        elements.sort_by_key(Element::position);

        // index pass: code -> node, built once
        let mut sub_budget_index: HashMap<&'doc str, NodeId> = HashMap::new();
        let mut title_index: HashMap<&'doc Code, NodeId> = HashMap::new();
        for (index, element) in elements.iter().copied().enumerate() {
            let id = NodeId(index);
            match element {
                Element::SubBudget(sub_budget) => {
                    insert_unique(&mut sub_budget_index, sub_budget.code.as_str(), id, &elements)?;
                }
                Element::Title(title) => {
                    insert_unique(&mut title_index, &title.code, id, &elements)?;
                }
                Element::LineItem(_) => {}
            }
        }

        // link pass: resolve every parent reference through the index
        let mut nodes: Vec<Node<'doc>> = Vec::with_capacity(elements.len());
        let mut roots = Vec::new();
        let mut siblings: HashSet<(Option<NodeId>, Kind, String)> =
            HashSet::with_capacity(elements.len());

        for (index, element) in elements.iter().copied().enumerate() {
            let parent = match element {
                Element::SubBudget(_) => None,
                Element::Title(title) => resolve(
                    &element,
                    title.parent.as_ref(),
                    title.sub_budget.as_deref(),
                    &title_index,
                    &sub_budget_index,
                )?,
                Element::LineItem(item) => resolve(
                    &element,
                    item.title.as_ref(),
                    item.sub_budget.as_deref(),
                    &title_index,
                    &sub_budget_index,
                )?,
            };

            if !siblings.insert((parent, element.kind(), element.code())) {
                let first = elements[..index]
                    .iter()
                    .zip(&nodes)
                    .find(|(other, node)| {
                        node.parent == parent
                            && other.kind() == element.kind()
                            && other.code() == element.code()
                    })
                    .map(|(other, _)| other.label().to_string())
                    .unwrap_or_default();
                return Err(AssemblyError::DuplicateCode {
                    code: element.code(),
                    first,
                    second: element.label().to_string(),
                });
            }

            nodes.push(Node {
                element,
                parent,
                children: Vec::new(),
            });
        }

        // parents may be declared after their children in hand-built input,
        // so children are attached once every node exists
        for index in 0..nodes.len() {
            let id = NodeId(index);
            match nodes[index].parent {
                Some(parent) => nodes[parent.0].children.push(id),
                None => roots.push(id),
            }
        }

        let tree = Self { nodes, roots };
        tree.check_reachable()?;
        tracing::debug!(nodes = tree.nodes.len(), roots = tree.roots.len(), "assembled outline");

        Ok(tree)
    }

    fn check_reachable(&self) -> Result<(), AssemblyError> {
        let mut reached = vec![false; self.nodes.len()];
        for (id, _) in self.walk() {
            reached[id.0] = true;
        }
        let codes: Vec<String> = self
            .iter()
            .filter(|(id, _)| !reached[id.0])
            .map(|(_, node)| node.element.code())
            .collect();
        if codes.is_empty() {
            Ok(())
        } else {
            Err(AssemblyError::ParentCycle { codes })
        }
    }

    /// Root nodes in declaration order.
    #[must_use]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Returns the node with the given id.
    ///
    /// # Panics
    ///
    /// Panics if the id was issued by a different tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node<'doc> {
        &self.nodes[id.0]
    }

    /// Children of a node in declaration order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over all nodes with their ids, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<'doc>)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    /// Finds the node of the title with the given code.
    #[must_use]
    pub fn find_title(&self, code: &Code) -> Option<NodeId> {
        self.iter().find_map(|(id, node)| match node.element {
            Element::Title(title) if &title.code == code => Some(id),
            _ => None,
        })
    }

    /// Depth-first, pre-order walk yielding each node with its depth (roots
    /// are at depth 0).
    #[must_use]
    pub fn walk(&self) -> Walk<'_, 'doc> {
        Walk {
            tree: self,
            stack: self.roots.iter().rev().map(|&id| (id, 0)).collect(),
        }
    }
}

/// Pre-order iterator returned by [`BudgetTree::walk`].
#[derive(Debug)]
pub struct Walk<'t, 'doc> {
    tree: &'t BudgetTree<'doc>,
    stack: Vec<(NodeId, usize)>,
}

impl Iterator for Walk<'_, '_> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        self.stack.extend(
            self.tree
                .children(id)
                .iter()
                .rev()
                .map(|&child| (child, depth + 1)),
        );
        Some((id, depth))
    }
}

fn insert_unique<'doc, K>(
    index: &mut HashMap<K, NodeId>,
    key: K,
    id: NodeId,
    elements: &[Element<'doc>],
) -> Result<(), AssemblyError>
where
    K: std::hash::Hash + Eq,
{
    match index.entry(key) {
        Entry::Occupied(existing) => {
            let first = elements[existing.get().0];
            let second = elements[id.0];
            Err(AssemblyError::DuplicateCode {
                code: second.code(),
                first: first.label().to_string(),
                second: second.label().to_string(),
            })
        }
        Entry::Vacant(slot) => {
            slot.insert(id);
            Ok(())
        }
    }
}

fn resolve(
    element: &Element<'_>,
    title: Option<&Code>,
    sub_budget: Option<&str>,
    title_index: &HashMap<&Code, NodeId>,
    sub_budget_index: &HashMap<&str, NodeId>,
) -> Result<Option<NodeId>, AssemblyError> {
    let unresolved = |parent: String| AssemblyError::UnresolvedParent {
        code: element.code(),
        parent,
    };

    if let Some(code) = title {
        return title_index
            .get(code)
            .copied()
            .map(Some)
            .ok_or_else(|| unresolved(code.to_string()));
    }
    if let Some(code) = sub_budget {
        return sub_budget_index
            .get(code)
            .copied()
            .map(Some)
            .ok_or_else(|| unresolved(code.to_string()));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::budget::Resources;

    fn code(s: &str) -> Code {
        s.parse().unwrap()
    }

    fn title(code_str: &str, name: &str, position: usize) -> Title {
        let code = code(code_str);
        Title {
            level: u8::try_from(code.depth()).unwrap(),
            number: code.sequence().get(),
            parent: code.parent(),
            code,
            name: name.to_string(),
            sub_budget: None,
            position,
        }
    }

    fn item(code_str: &str, position: usize) -> LineItem {
        let code = code(code_str);
        LineItem {
            number: code.sequence().get(),
            title: code.parent(),
            code,
            sub_budget: None,
            description: format!("item {code_str}"),
            unit: "m3".to_string(),
            yield_factor: 1.0,
            resources: Resources::default(),
            position,
        }
    }

    fn labels(tree: &BudgetTree<'_>, ids: &[NodeId]) -> Vec<String> {
        ids.iter()
            .map(|&id| tree.node(id).element().code())
            .collect()
    }

    #[test]
    fn nests_titles_and_items() {
        let titles = vec![
            title("01", "EARTHWORKS", 0),
            title("01.01", "EXCAVATION", 2),
            title("02", "CONCRETE", 4),
        ];
        let items = vec![item("01.01", 1), item("01.01.01", 3), item("02.01", 5)];

        let tree = BudgetTree::from_parts(&[], &titles, &items).unwrap();

        assert_eq!(tree.len(), 6);
        assert_eq!(labels(&tree, tree.roots()), ["01", "02"]);

        let earthworks = tree.roots()[0];
        // item 01.01 was declared before title 01.01, so it comes first
        assert_eq!(labels(&tree, tree.children(earthworks)), ["01.01", "01.01"]);
        let excavation = tree.find_title(&code("01.01")).unwrap();
        assert_eq!(labels(&tree, tree.children(excavation)), ["01.01.01"]);
        assert_eq!(tree.node(excavation).parent(), Some(earthworks));
    }

    #[test]
    fn every_element_appears_exactly_once() {
        let titles = vec![title("01", "A", 0), title("01.01", "B", 1)];
        let items = vec![item("01.01.01", 2), item("01.01.02", 3)];
        let tree = BudgetTree::from_parts(&[], &titles, &items).unwrap();

        let mut seen: Vec<NodeId> = tree.walk().map(|(id, _)| id).collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), titles.len() + items.len());
    }

    #[test]
    fn walk_is_preorder_with_depth() {
        let titles = vec![title("01", "A", 0), title("01.01", "B", 1), title("02", "C", 3)];
        let items = vec![item("01.01.01", 2)];
        let tree = BudgetTree::from_parts(&[], &titles, &items).unwrap();

        let walked: Vec<(String, usize)> = tree
            .walk()
            .map(|(id, depth)| (tree.node(id).element().code(), depth))
            .collect();
        assert_eq!(
            walked,
            [
                ("01".to_string(), 0),
                ("01.01".to_string(), 1),
                ("01.01.01".to_string(), 2),
                ("02".to_string(), 0),
            ]
        );
    }

    #[test]
    fn sub_budgets_own_root_titles() {
        let sub_budgets = vec![
            SubBudget {
                code: "S1".to_string(),
                name: "Structures".to_string(),
                order: 1,
                position: 0,
            },
            SubBudget {
                code: "S2".to_string(),
                name: "Finishes".to_string(),
                order: 2,
                position: 2,
            },
        ];
        let mut first = title("01", "A", 1);
        first.sub_budget = Some("S1".to_string());
        let mut second = title("02", "B", 3);
        second.sub_budget = Some("S2".to_string());
        let titles = vec![first, second];

        let tree = BudgetTree::from_parts(&sub_budgets, &titles, &[]).unwrap();

        assert_eq!(labels(&tree, tree.roots()), ["S1", "S2"]);
        assert_eq!(labels(&tree, tree.children(tree.roots()[1])), ["02"]);
    }

    #[test]
    fn missing_parent_is_reported() {
        let titles = vec![title("01.01", "ORPHAN", 0)];
        let error = BudgetTree::from_parts(&[], &titles, &[]).unwrap_err();
        assert_eq!(
            error,
            AssemblyError::UnresolvedParent {
                code: "01.01".to_string(),
                parent: "01".to_string(),
            }
        );
    }

    #[test]
    fn parent_cycles_are_reported() {
        let mut first = title("01", "A", 0);
        first.parent = Some(code("02"));
        let mut second = title("02", "B", 1);
        second.parent = Some(code("01"));
        let titles = vec![first, second];
        let items = vec![item("02.01", 2)];

        let error = BudgetTree::from_parts(&[], &titles, &items).unwrap_err();
        assert_eq!(
            error,
            AssemblyError::ParentCycle {
                codes: vec!["01".to_string(), "02".to_string(), "02.01".to_string()],
            }
        );
        assert_eq!(error.to_string(), "parent cycle among 01, 02, 02.01");
    }

    #[test]
    fn missing_sub_budget_is_reported() {
        let mut orphan = title("01", "A", 0);
        orphan.sub_budget = Some("S9".to_string());
        let titles = vec![orphan];
        let error = BudgetTree::from_parts(&[], &titles, &[]).unwrap_err();
        assert!(matches!(error, AssemblyError::UnresolvedParent { parent, .. } if parent == "S9"));
    }

    #[test]
    fn duplicate_title_codes_are_reported() {
        let titles = vec![title("01", "FIRST", 0), title("01", "SECOND", 1)];
        let error = BudgetTree::from_parts(&[], &titles, &[]).unwrap_err();
        assert_eq!(
            error,
            AssemblyError::DuplicateCode {
                code: "01".to_string(),
                first: "FIRST".to_string(),
                second: "SECOND".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_sibling_items_are_reported() {
        let titles = vec![title("01", "A", 0)];
        let items = vec![item("01.01", 1), item("01.01", 2)];
        let error = BudgetTree::from_parts(&[], &titles, &items).unwrap_err();
        assert!(matches!(error, AssemblyError::DuplicateCode { code, .. } if code == "01.01"));
    }

    #[test]
    fn untitled_items_do_not_collide_with_titles() {
        let titles = vec![title("01", "A", 1)];
        let mut untitled = item("01", 0);
        untitled.title = None;
        let items = vec![untitled];

        let tree = BudgetTree::from_parts(&[], &titles, &items).unwrap();
        assert_eq!(tree.roots().len(), 2);
    }

    #[test]
    fn large_documents_assemble() {
        let mut titles = Vec::new();
        let mut items = Vec::new();
        let mut position = 0;
        for t in 1..=200 {
            titles.push(title(&format!("{t:02}"), "T", position));
            position += 1;
            for i in 1..=25 {
                items.push(item(&format!("{t:02}.{i:02}"), position));
                position += 1;
            }
        }

        let tree = BudgetTree::from_parts(&[], &titles, &items).unwrap();
        assert_eq!(tree.roots().len(), 200);
        assert!(tree.roots().iter().all(|&id| tree.children(id).len() == 25));
    }
}
