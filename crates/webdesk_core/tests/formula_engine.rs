use webdesk_core::{CellCoord, EvalErrorKind, SheetEngine, Value};

fn at(reference: &str) -> CellCoord {
    CellCoord::parse(reference).unwrap()
}

#[test]
fn aggregate_updates_when_an_input_changes() {
    let mut engine = SheetEngine::new();
    engine.set_cell(at("A1"), "2");
    engine.set_cell(at("A2"), "3");
    engine.set_cell(at("A3"), "=SUM(A1:A2)");
    assert_eq!(engine.get_value(at("A3")), Value::Number(5.0));

    engine.set_cell(at("A1"), "10");
    assert_eq!(engine.get_value(at("A3")), Value::Number(13.0));
    assert!(engine.dependents(at("A1")).contains(&at("A3")));
}

#[test]
fn count_includes_text_cells_and_skips_empty_ones() {
    let mut engine = SheetEngine::new();
    engine.set_cell(at("A1"), "hello");
    engine.set_cell(at("A2"), "2");
    engine.set_cell(at("A3"), "=COUNT(A1:A2)");
    assert_eq!(engine.get_value(at("A3")), Value::Number(2.0));

    // A4 is empty, so widening the range does not change the tally.
    engine.set_cell(at("A5"), "=COUNT(A1:A4)");
    assert_eq!(engine.get_value(at("A5")), Value::Number(2.0));
}

#[test]
fn chained_formulas_evaluate_through_intermediates() {
    let mut engine = SheetEngine::new();
    engine.set_cell(at("A1"), "4");
    engine.set_cell(at("B1"), "=A1*A1");
    engine.set_cell(at("C1"), "=SQRT(B1)+1");
    assert_eq!(engine.get_value(at("C1")), Value::Number(5.0));
}

#[test]
fn mutual_references_render_the_cycle_sentinel() {
    let mut engine = SheetEngine::new();
    engine.set_cell(at("A1"), "=B1");
    engine.set_cell(at("B1"), "=A1");

    assert_eq!(engine.get_value(at("A1")).display_text(), "#CYCLE!");
    assert_eq!(engine.get_value(at("B1")).display_text(), "#CYCLE!");

    // Breaking the cycle recovers both cells.
    engine.set_cell(at("B1"), "7");
    assert_eq!(engine.get_value(at("A1")), Value::Number(7.0));
}

#[test]
fn error_inputs_surface_as_sentinels_not_panics() {
    let mut engine = SheetEngine::new();
    engine.set_cell(at("A1"), "=1/B1");
    engine.set_cell(at("A2"), "=NOSUCHFN(1)");
    engine.set_cell(at("A3"), "=1+*2");
    engine.set_cell(at("A4"), "=UPPER(A2)");

    assert_eq!(engine.get_value(at("A1")).display_text(), "#DIV/0!");
    assert_eq!(engine.get_value(at("A2")).display_text(), "#NAME?");
    assert_eq!(engine.get_value(at("A3")).display_text(), "#PARSE!");
    assert_eq!(
        engine.get_value(at("A4")),
        Value::Error(EvalErrorKind::UnknownFunction("NOSUCHFN".to_string()))
    );
}

#[test]
fn text_and_logic_functions_compose() {
    let mut engine = SheetEngine::new();
    engine.set_cell(at("A1"), "widget");
    engine.set_cell(at("A2"), "=UPPER(LEFT(A1, 3)) & \"-\" & LEN(A1)");
    assert_eq!(
        engine.get_value(at("A2")),
        Value::Text("WID-6".to_string())
    );

    engine.set_cell(at("B1"), "15");
    engine.set_cell(at("B2"), "=IF(AND(B1>10, B1<20), \"mid\", \"edge\")");
    assert_eq!(engine.get_value(at("B2")), Value::Text("mid".to_string()));

    engine.set_cell(at("B3"), "=IFERROR(1/0, \"fallback\")");
    assert_eq!(
        engine.get_value(at("B3")),
        Value::Text("fallback".to_string())
    );
}

#[test]
fn date_functions_agree_with_todays_date() {
    let mut engine = SheetEngine::new();
    engine.set_cell(at("A1"), "=TODAY()");
    engine.set_cell(at("A2"), "=YEAR(A1)");
    engine.set_cell(at("A3"), "=MONTH(A1)");

    let today = engine.get_value(at("A1")).display_text();
    assert_eq!(today.len(), 10);

    let year: f64 = today[0..4].parse().unwrap();
    let month: f64 = today[5..7].parse().unwrap();
    assert_eq!(engine.get_value(at("A2")), Value::Number(year));
    assert_eq!(engine.get_value(at("A3")), Value::Number(month));
}

#[test]
fn recalculate_all_reports_every_formula_cell() {
    let mut engine = SheetEngine::new();
    engine.set_cell(at("A1"), "1");
    engine.set_cell(at("A2"), "=A1+1");
    engine.set_cell(at("A3"), "=A2+1");
    engine.set_cell(at("B1"), "plain text");

    let results = engine.recalculate_all();
    assert_eq!(results.len(), 2);
    assert!(results.contains(&(at("A2"), Value::Number(2.0))));
    assert!(results.contains(&(at("A3"), Value::Number(3.0))));
}

#[test]
fn removing_a_cell_blanks_downstream_reads() {
    let mut engine = SheetEngine::new();
    engine.set_cell(at("A1"), "5");
    engine.set_cell(at("A2"), "=A1*2");
    assert_eq!(engine.get_value(at("A2")), Value::Number(10.0));

    engine.remove_cell(at("A1"));
    // Blank coerces to zero in arithmetic.
    assert_eq!(engine.get_value(at("A2")), Value::Number(0.0));
    assert_eq!(engine.get_value(at("A1")), Value::Blank);
}
