use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use keyforge_evolve::chromosome::Chromosome;
use keyforge_evolve::individual::Individual;
use keyforge_evolve::optimizer::RunResult;
use keyforge_evolve::scorer::FitnessResult;

fn fmt_f(v: Option<f64>, precision: usize) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{:.*}", precision, x),
        Some(_) => "inf".to_string(),
        None => "-".to_string(),
    }
}

pub fn print_layout_grid(name: &str, chromosome: &Chromosome, cols: usize) {
    println!("\nLayout: {}", name);
    for (idx, layer) in chromosome.layers().iter().enumerate() {
        let mut table = Table::new();
        table.load_preset(ASCII_FULL);
        for chunk in layer.genes().chunks(cols.max(1)) {
            let cells: Vec<Cell> = chunk
                .iter()
                .map(|c| Cell::new(c.to_string()).set_alignment(CellAlignment::Center))
                .collect();
            table.add_row(cells);
        }
        println!("Layer {}:\n{}", idx, table);
    }
}

pub fn print_top_individuals(individuals: &[Individual], limit: usize) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Id"),
        Cell::new("Gen"),
        Cell::new("Lineage"),
        Cell::new("Fitness").fg(Color::Cyan),
        Cell::new("Distance"),
        Cell::new("Time"),
        Cell::new("Layers"),
        Cell::new("Base layer"),
    ]);
    for i in 1..=7 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    let mut sorted: Vec<&Individual> = individuals.iter().collect();
    sorted.sort_by(|a, b| a.cmp_fitness(b));

    for (rank, ind) in sorted.into_iter().take(limit).enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1).add_attribute(Attribute::Bold),
            Cell::new(ind.id()),
            Cell::new(ind.generation()),
            Cell::new(ind.lineage()),
            Cell::new(fmt_f(ind.fitness(), 5)).fg(Color::Cyan),
            Cell::new(fmt_f(ind.distance(), 1)),
            Cell::new(fmt_f(ind.time(), 2)),
            Cell::new(ind.chromosome().layer_count()),
            Cell::new(ind.chromosome().base().to_string()),
        ]);
    }
    println!("\n{}", table);
}

pub fn print_run_summary(result: &RunResult) {
    let s = &result.stats;
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.add_row(vec![Cell::new("Run"), Cell::new(&result.state.run_id)]);
    table.add_row(vec![Cell::new("Status"), Cell::new(result.status)]);
    table.add_row(vec![
        Cell::new("Generations"),
        Cell::new(result.state.generation),
    ]);
    table.add_row(vec![
        Cell::new("Evaluated"),
        Cell::new(result.state.history.len()),
    ]);
    table.add_row(vec![Cell::new("Jobs"), Cell::new(s.jobs)]);
    table.add_row(vec![Cell::new("Cache hits"), Cell::new(s.cache_hits)]);
    table.add_row(vec![
        Cell::new("Failures").fg(Color::Red),
        Cell::new(s.failures),
    ]);
    table.add_row(vec![Cell::new("Retries"), Cell::new(s.retries)]);
    table.add_row(vec![Cell::new("Timeouts"), Cell::new(s.timeouts)]);
    println!("\n{}", table);
}

pub fn print_score(name: &str, r: &FitnessResult) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(vec![
        Cell::new("Layout").add_attribute(Attribute::Bold),
        Cell::new("Fitness").fg(Color::Cyan),
        Cell::new("Distance"),
        Cell::new("Time"),
    ]);
    table.add_row(vec![
        Cell::new(name).add_attribute(Attribute::Bold),
        Cell::new(fmt_f(Some(r.fitness), 5)).fg(Color::Cyan),
        Cell::new(fmt_f(Some(r.distance), 1)),
        Cell::new(fmt_f(Some(r.time), 2)),
    ]);
    println!("\n{}", table);
}
