use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};
use tokenbridge::Encoding;

/// Renders an encoding as one row per token.
pub fn encoding_table(encoding: &Encoding) -> Table {
    let header = |name: &str| Cell::new(name).fg(comfy_table::Color::Cyan).add_attribute(Attribute::Bold);

    let mut table = Table::new();
    table
        .set_header(vec![
            header("#"),
            header("ID"),
            header("Token"),
            header("Type"),
            header("Special"),
            header("Attention"),
            header("Offsets"),
        ])
        .load_preset(comfy_table::presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let text = |value: Option<String>| value.unwrap_or_else(|| "-".to_string());
    for (i, id) in encoding.ids.iter().enumerate() {
        let token = encoding.tokens.as_ref().map(|t| t[i].clone());
        let type_id = encoding.type_ids.as_ref().map(|t| t[i].to_string());
        let special = encoding.special_tokens_mask.as_ref().map(|m| m[i].to_string());
        let attention = encoding.attention_mask.as_ref().map(|m| m[i].to_string());
        let offsets = encoding
            .offsets
            .as_ref()
            .map(|o| format!("{}..{}", o[i].0, o[i].1));

        table.add_row(vec![
            Cell::new(i).set_alignment(CellAlignment::Right),
            Cell::new(id).fg(comfy_table::Color::Yellow).set_alignment(CellAlignment::Right),
            Cell::new(text(token)).fg(comfy_table::Color::Green),
            Cell::new(text(type_id)).set_alignment(CellAlignment::Center),
            Cell::new(text(special)).set_alignment(CellAlignment::Center),
            Cell::new(text(attention)).set_alignment(CellAlignment::Center),
            Cell::new(text(offsets)).fg(comfy_table::Color::Blue),
        ]);
    }
    table
}
