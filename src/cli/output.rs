//! Text printed by the informational commands

pub fn version_line() -> String {
    format!("Version - {}", env!("CARGO_PKG_VERSION"))
}

/// Numbered model listing, 1-indexed in registry order
pub fn model_list(models: &[&str]) -> String {
    let mut out = String::from("Available List of models\n");
    for (i, model) in models.iter().enumerate() {
        out.push_str(&format!("\n{}. {}", i + 1, model));
    }
    out
}
