use std::{
    io::{self, Write},
    path::PathBuf,
};

use acu::{
    BudgetTree, Category, Config, CostRollup, Report, ReportRenderer, Summary, domain::Element,
};
use clap::Parser;
use tracing::instrument;

use super::terminal::{self, Palette, Style};

#[derive(Debug, Parser)]
pub struct Tree {
    /// The ACU file to show
    file: PathBuf,

    /// Only show this many levels of the outline
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..))]
    depth: Option<u8>,
}

impl Tree {
    #[instrument(level = "debug", skip(self, config), fields(file = %self.file.display()))]
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let document = super::read_document(&self.file, config)?;
        let tree = BudgetTree::assemble(&document)?;
        let costs = CostRollup::compute(&tree)?;

        let palette = Palette::detect();
        let stdout = io::stdout().lock();
        let mut renderer = OutlineRenderer::new(stdout, terminal::terminal_width(), palette)
            .depth(self.depth.map(usize::from));
        renderer.render(&Report::new(&document.budget, &tree, &costs))?;

        let summary = Summary::new(&document, &costs);
        println!("{}", palette.paint(Style::Muted, &describe(&summary)));
        Ok(())
    }
}

fn describe(summary: &Summary) -> String {
    format!(
        "{} sub-budgets, {} titles, {} line items, {} levels",
        summary.sub_budgets, summary.titles, summary.line_items, summary.max_level
    )
}

/// Prints a costed outline as indented rows with right-aligned subtotals,
/// followed by the category breakdown and the grand total.
#[derive(Debug)]
pub struct OutlineRenderer<W> {
    out: W,
    width: usize,
    depth: Option<usize>,
    palette: Palette,
}

impl<W: Write> OutlineRenderer<W> {
    pub const fn new(out: W, width: usize, palette: Palette) -> Self {
        Self {
            out,
            width,
            depth: None,
            palette,
        }
    }

    /// Hides nodes nested deeper than `depth` levels.
    pub const fn depth(mut self, depth: Option<usize>) -> Self {
        self.depth = depth;
        self
    }

    fn row(&mut self, left: &str, right: &str, style: Option<Style>) -> io::Result<()> {
        let room = self.width.saturating_sub(right.len() + 1).max(1);
        let left = truncate(left, room);
        let padding = self.width.saturating_sub(left.chars().count() + right.len()).max(1);

        let left = style.map_or_else(|| left.clone(), |style| self.palette.paint(style, &left));
        let right = self.palette.paint(Style::Muted, right);
        writeln!(self.out, "{left}{:padding$}{right}", "")
    }
}

impl<W: Write> ReportRenderer for OutlineRenderer<W> {
    type Error = io::Error;

    fn render(&mut self, report: &Report<'_, '_>) -> io::Result<()> {
        let budget = report.budget;
        self.row(&format!("{} {}", budget.code, budget.name), report.currency, None)?;

        for (id, depth) in report.tree.walk() {
            if self.depth.is_some_and(|max| depth >= max) {
                continue;
            }
            let element = report.tree.node(id).element();
            let style = match element {
                Element::SubBudget(_) => Some(Style::SubBudget),
                Element::Title(_) => Some(Style::Title),
                Element::LineItem(_) => None,
            };
            let left = format!("{}{} {}", "  ".repeat(depth), element.code(), element.label());
            self.row(&left, &format!("{:.2}", report.costs.subtotal(id)), style)?;
        }

        writeln!(self.out)?;
        let by_category = report.costs.by_category();
        for category in Category::ALL {
            self.row(category.keyword(), &format!("{:.2}", by_category.get(category)), None)?;
        }
        self.row(
            "total",
            &format!("{:.2} {}", report.costs.total(), report.currency),
            None,
        )?;
        self.out.flush()
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max.saturating_sub(1)).collect();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
        @budget{P1, name = "House"}
        @title{1, name = "EARTHWORKS"}
        @title{2, name = "Excavation works"}
        @lineitem{description = "Trench", unit = "m3", yield = 2,
            materials = { {code = "M1", desc = "Sand", unit = "m3", quantity = 1.5, price = 10} }}
        @title{1, name = "CONCRETE"}
    "#;

    fn render(depth: Option<usize>, width: usize) -> Vec<String> {
        let document = acu::parse(SOURCE).unwrap();
        let tree = BudgetTree::assemble(&document).unwrap();
        let costs = CostRollup::compute(&tree).unwrap();

        let mut out = Vec::new();
        OutlineRenderer::new(&mut out, width, Palette::new(false))
            .depth(depth)
            .render(&Report::new(&document.budget, &tree, &costs))
            .unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn columns(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    #[test]
    fn outline_rows() {
        let lines = render(None, 50);

        assert_eq!(columns(&lines[0]), ["P1", "House", "PEN"]);
        assert_eq!(columns(&lines[1]), ["01", "EARTHWORKS", "30.00"]);
        assert_eq!(columns(&lines[2]), ["01.01", "Excavation", "works", "30.00"]);
        assert_eq!(columns(&lines[3]), ["01.01.01", "Trench", "30.00"]);
        assert_eq!(columns(&lines[4]), ["02", "CONCRETE", "0.00"]);
        assert!(lines[3].starts_with("    01.01.01"));
        assert!(lines[..5].iter().all(|line| line.chars().count() == 50));
    }

    #[test]
    fn footer_breaks_down_the_total() {
        let lines = render(None, 50);
        let footer: Vec<Vec<&str>> = lines[6..].iter().map(|line| columns(line)).collect();
        assert_eq!(
            footer,
            [
                vec!["labor", "0.00"],
                vec!["materials", "30.00"],
                vec!["equipment", "0.00"],
                vec!["subcontracts", "0.00"],
                vec!["total", "30.00", "PEN"],
            ]
        );
    }

    #[test]
    fn depth_limits_the_outline() {
        let lines = render(Some(1), 50);
        assert_eq!(columns(&lines[1]), ["01", "EARTHWORKS", "30.00"]);
        assert_eq!(columns(&lines[2]), ["02", "CONCRETE", "0.00"]);
        assert!(lines[3].is_empty());
    }

    #[test]
    fn long_labels_are_truncated() {
        let lines = render(None, 16);
        assert_eq!(lines[2], "  01.01 E… 30.00");
    }

    #[test]
    fn summary_line() {
        let document = acu::parse(SOURCE).unwrap();
        let tree = BudgetTree::assemble(&document).unwrap();
        let costs = CostRollup::compute(&tree).unwrap();
        assert_eq!(
            describe(&Summary::new(&document, &costs)),
            "0 sub-budgets, 3 titles, 1 line items, 2 levels"
        );
    }
}
