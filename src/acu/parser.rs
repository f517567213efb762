use std::collections::HashMap;

use tracing::{instrument, warn};

use crate::{
    acu::{
        ParseError,
        declaration::Declaration,
        lexer::tokenize,
        numbering::CodeGenerator,
        scanner::{Block, scan},
    },
    domain::{Budget, Code, Config, LineItem, ParsedDocument, SubBudget, Title},
};

/// Parses ACU text with the default [`Config`].
///
/// # Errors
///
/// See [`parse_with_config`].
pub fn parse(source: &str) -> Result<ParsedDocument, ParseError> {
    parse_with_config(source, &Config::default())
}

/// Parses ACU text into a [`ParsedDocument`].
///
/// Every call numbers its titles and line items with its own
/// [`CodeGenerator`], so independent documents may be parsed concurrently.
///
/// # Errors
///
/// Returns the first [`ParseError`] found; the document is rejected as a
/// whole.
#[instrument(level = "debug", skip_all, fields(bytes = source.len()))]
pub fn parse_with_config(source: &str, config: &Config) -> Result<ParsedDocument, ParseError> {
    let blocks = scan(tokenize(source)?)?;
    let mut builder = DocumentBuilder::new(config);
    for block in &blocks {
        builder.push(block)?;
    }
    builder.finish()
}

/// Single-use state of one parse.
struct DocumentBuilder<'c> {
    config: &'c Config,
    codes: CodeGenerator,
    budget: Option<(Budget, usize)>,
    sub_budgets: Vec<SubBudget>,
    titles: Vec<Title>,
    line_items: Vec<LineItem>,
    /// Sub-budget of each title code, for the elements nested under it.
    title_owners: HashMap<Code, Option<String>>,
    position: usize,
}

impl<'c> DocumentBuilder<'c> {
    fn new(config: &'c Config) -> Self {
        Self {
            config,
            codes: CodeGenerator::new(),
            budget: None,
            sub_budgets: Vec::new(),
            titles: Vec::new(),
            line_items: Vec::new(),
            title_owners: HashMap::new(),
            position: 0,
        }
    }

    /// Elements nested under a title share its sub-budget; root titles and
    /// untitled items take the most recently declared one.
    fn sub_budget(&self, parent: Option<&Code>) -> Option<String> {
        match parent.and_then(|code| self.title_owners.get(code)) {
            Some(owner) => owner.clone(),
            None => self.sub_budgets.last().map(|sub_budget| sub_budget.code.clone()),
        }
    }

    fn next_position(&mut self) -> usize {
        let position = self.position;
        self.position += 1;
        position
    }

    fn push(&mut self, block: &Block) -> Result<(), ParseError> {
        match Declaration::decode(block)? {
            Declaration::Budget {
                code,
                name,
                client,
                location,
                currency,
            } => {
                if let Some((_, first)) = &self.budget {
                    return Err(ParseError::DuplicateBudget {
                        line: block.line,
                        first: *first,
                    });
                }
                let currency =
                    currency.unwrap_or_else(|| self.config.default_currency().to_string());
                self.budget = Some((
                    Budget {
                        code,
                        name,
                        client,
                        location,
                        currency,
                    },
                    block.line,
                ));
            }
            Declaration::SubBudget { code, name } => {
                let position = self.next_position();
                let order = self.sub_budgets.len() + 1;
                self.sub_budgets.push(SubBudget {
                    code,
                    name,
                    order,
                    position,
                });
            }
            Declaration::Title { level, name } => {
                let code = self.codes.next_title(usize::from(level));
                let position = self.next_position();
                let parent = code.parent();
                let sub_budget = self.sub_budget(parent.as_ref());
                self.title_owners.insert(code.clone(), sub_budget.clone());
                self.titles.push(Title {
                    level,
                    number: code.sequence().get(),
                    parent,
                    code,
                    name,
                    sub_budget,
                    position,
                });
            }
            Declaration::LineItem {
                description,
                unit,
                yield_factor,
                resources,
            } => {
                let (title, code) = self.codes.next_line_item();
                if title.is_none() {
                    warn!(
                        line = block.line,
                        %code,
                        "line item declared outside of any title"
                    );
                }
                let position = self.next_position();
                let sub_budget = self.sub_budget(title.as_ref());
                self.line_items.push(LineItem {
                    number: code.sequence().get(),
                    code,
                    title,
                    sub_budget,
                    description,
                    unit,
                    yield_factor: yield_factor.unwrap_or(1.0),
                    resources,
                    position,
                });
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<ParsedDocument, ParseError> {
        let (budget, _) = self.budget.ok_or(ParseError::MissingBudget)?;
        tracing::debug!(
            sub_budgets = self.sub_budgets.len(),
            titles = self.titles.len(),
            line_items = self.line_items.len(),
            "parsed document"
        );
        Ok(ParsedDocument {
            budget,
            sub_budgets: self.sub_budgets,
            titles: self.titles,
            line_items: self.line_items,
        })
    }
}
