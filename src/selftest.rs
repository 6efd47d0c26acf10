// Fixed scenario suite behind `salesplot --self-test`

use crate::error::{ChartError, InvalidDataError, TableError};
use crate::report::{ChartHandle, DiagnosticLog, MemoryLog, NullSurface, Renderer, Surface};
use crate::table::{Column, Table};

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

type Check = fn(Result<ChartHandle, ChartError>) -> Result<(), String>;

/// A scenario's input table, or the reason it could not be built
type Fixture = Result<Table, String>;

fn fixture(result: Result<Table, TableError>) -> Fixture {
    result.map_err(|e| format!("fixture construction failed: {}", e))
}

fn sample_table() -> Fixture {
    fixture(Table::new(vec![
        Column::new("Category", vec!["Electronics", "Clothing", "Home", "Books", "Sports"]),
        Column::new("Sales", vec![1000, 1500, 1200, 800, 1100]),
    ]))
}

fn expect_bars(result: Result<ChartHandle, ChartError>, n: usize) -> Result<(), String> {
    match result {
        Ok(chart) if chart.bars().len() == n => Ok(()),
        Ok(chart) => Err(format!("expected {} bars, got {}", n, chart.bars().len())),
        Err(e) => Err(format!("unexpected error: {}", e)),
    }
}

fn expect_invalid(
    result: Result<ChartHandle, ChartError>,
    kind: InvalidDataError,
) -> Result<(), String> {
    match result {
        Err(ChartError::InvalidData(found)) if found == kind => Ok(()),
        Err(e) => Err(format!("expected invalid data ({}), got: {}", kind, e)),
        Ok(_) => Err(format!("expected invalid data ({}), got a chart", kind)),
    }
}

struct Scenario {
    name: &'static str,
    table: Fixture,
    category_col: &'static str,
    check: Check,
}

fn scenarios() -> Vec<Scenario> {
    let sample = sample_table();
    let empty = fixture(Table::new(vec![
        Column::new("Category", Vec::<String>::new()),
        Column::new("Sales", Vec::<String>::new()),
    ]));
    let text_sales = fixture(Table::new(vec![
        Column::new("Category", vec!["Electronics", "Clothing"]),
        Column::new("Sales", vec!["high", "low"]),
    ]));
    let single = sample.as_ref().map(|t| t.head(1)).map_err(Clone::clone);
    let doubled = sample
        .as_ref()
        .map_err(Clone::clone)
        .and_then(|t| fixture(t.concat(t)));

    vec![
        Scenario {
            name: "sales_data_input",
            table: sample.clone(),
            category_col: "Category",
            check: |r| expect_bars(r, 5),
        },
        Scenario {
            name: "single_category_input",
            table: single,
            category_col: "Category",
            check: |r| expect_bars(r, 1),
        },
        Scenario {
            name: "no_data",
            table: empty,
            category_col: "Category",
            check: |r| expect_invalid(r, InvalidDataError::EmptyOrNonNumeric),
        },
        Scenario {
            name: "non_numeric_sales",
            table: text_sales,
            category_col: "Category",
            check: |r| expect_invalid(r, InvalidDataError::EmptyOrNonNumeric),
        },
        Scenario {
            name: "duplicate_category_input",
            table: doubled,
            category_col: "Category",
            check: |r| expect_invalid(r, InvalidDataError::DuplicateCategories),
        },
        Scenario {
            name: "invalid_columns",
            table: sample,
            category_col: "NonexistentCategory",
            check: |r| match r {
                Err(ChartError::ColumnNotFound { .. }) => Ok(()),
                Err(e) => Err(format!("expected a missing column error, got: {}", e)),
                Ok(_) => Err("expected a missing column error, got a chart".to_string()),
            },
        },
    ]
}

fn run_scenario<L, S>(renderer: &mut Renderer<L, S>, scenario: Scenario) -> ScenarioOutcome
where
    L: DiagnosticLog,
    S: Surface,
{
    let outcome = scenario.table.and_then(|table| {
        (scenario.check)(renderer.render(&table, scenario.category_col, "Sales"))
    });

    ScenarioOutcome {
        name: scenario.name,
        passed: outcome.is_ok(),
        detail: outcome.err().unwrap_or_default(),
    }
}

/// Run every scenario against a headless renderer.
pub fn run_suite() -> Vec<ScenarioOutcome> {
    let mut renderer = Renderer::new(MemoryLog::new(), NullSurface);

    scenarios()
        .into_iter()
        .map(|scenario| run_scenario(&mut renderer, scenario))
        .collect()
}
