//! `bulkseed plan`: print the resolved load order.

use crate::PlanArgs;
use anyhow::Context;
use seed_core::{DependencyGraph, LoadPlan};
use std::fmt::Write;
use std::path::Path;

/// The graph from `schema`, or the built-in e-commerce graph.
pub fn load_graph(schema: Option<&Path>) -> anyhow::Result<DependencyGraph> {
    match schema {
        Some(path) => DependencyGraph::from_file(path)
            .with_context(|| format!("Failed to load schema from {}", path.display())),
        None => DependencyGraph::ecommerce().context("Built-in e-commerce schema is invalid"),
    }
}

/// Resolve the order, optionally restricted to `tables`.
pub fn resolve_plan(graph: &DependencyGraph, tables: &[String]) -> anyhow::Result<LoadPlan> {
    let plan = graph
        .topological_order()
        .context("Schema cannot be loaded in dependency order")?;
    if tables.is_empty() {
        Ok(plan)
    } else {
        plan.restrict(tables).context("Invalid --tables")
    }
}

/// One line per table with the parents it draws keys from.
pub fn render_plan(plan: &LoadPlan) -> String {
    let mut out = format!("Load order ({} tables):\n", plan.len());
    for (i, table) in plan.tables().iter().enumerate() {
        let parents = table.parent_tables();
        if parents.is_empty() {
            let _ = writeln!(out, "{:>3}. {}", i + 1, table.name);
        } else {
            let _ = writeln!(
                out,
                "{:>3}. {:<24} <- {}",
                i + 1,
                table.name,
                parents.join(", ")
            );
        }
    }
    out
}

pub fn run_plan(args: &PlanArgs) -> anyhow::Result<()> {
    let graph = load_graph(args.schema.as_deref())?;
    let plan = resolve_plan(&graph, &args.tables)?;
    print!("{}", render_plan(&plan));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_builtin_plan() {
        let graph = load_graph(None).unwrap();
        let plan = resolve_plan(&graph, &[]).unwrap();
        let text = render_plan(&plan);

        assert!(text.starts_with("Load order (12 tables):\n"));
        assert!(text.contains("  1. categories\n"));
        let order_items = text.lines().find(|l| l.contains("order_items")).unwrap();
        assert!(order_items.ends_with("<- orders, products"));
    }

    #[test]
    fn test_unknown_table_rejected() {
        let graph = load_graph(None).unwrap();
        let err = resolve_plan(&graph, &["invoices".to_string()]).unwrap_err();
        assert!(format!("{err:#}").contains("invoices"));
    }
}
