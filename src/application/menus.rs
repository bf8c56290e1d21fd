//! Menu builders for each stage's next expected selection.

use crate::domain::catalog::Catalog;
use crate::domain::tally::Tally;

use super::event::tokens;
use super::reply::{Button, Menu};

/// Input-mode choice offered right after start.
pub fn input_mode() -> Menu {
    Menu::new()
        .row(vec![
            Button::new("Upload image", tokens::MODE_IMAGE),
            Button::new("Paste text", tokens::MODE_TEXT),
        ])
        .single("Cancel", tokens::CANCEL)
}

/// Main curation menu over the current tally.
pub fn edit_menu() -> Menu {
    Menu::new()
        .single("Bulk edit all votes", tokens::BULK_EDIT)
        .single("Edit individual vote", tokens::EDIT_INDIVIDUAL)
        .single("Add candidate", tokens::ADD_CANDIDATE)
        .single("Remove candidate", tokens::REMOVE_CANDIDATE)
        .single("Submit votes", tokens::SUBMIT_VOTES)
        .single("Cancel", tokens::CANCEL)
}

/// One button per tally entity, token = `<prefix><name>`, plus back/cancel.
pub fn entity_picker(tally: &Tally, prefix: &str) -> Menu {
    let mut menu = Menu::new();
    for name in tally.names() {
        menu = menu.single(name, format!("{}{}", prefix, name));
    }
    menu.single("Back to edit menu", tokens::BACK_EDIT_MENU)
        .single("Cancel", tokens::CANCEL)
}

/// One button per catalog region.
pub fn regions(catalog: &Catalog) -> Menu {
    let mut menu = Menu::new();
    for region in catalog.region_names() {
        menu = menu.single(region, format!("{}{}", tokens::REGION_PREFIX, region));
    }
    menu.single("Cancel", tokens::CANCEL)
}

/// One button per district of the region; districts that already hold
/// submitted data are annotated. `submitted` is expected lower-cased.
pub fn districts(catalog: &Catalog, region: &str, submitted: &[String]) -> Menu {
    let mut menu = Menu::new();
    for district in catalog.districts(region).unwrap_or(&[]) {
        let label = if submitted.contains(&district.to_lowercase()) {
            format!("{} [has data]", district)
        } else {
            district.clone()
        };
        menu = menu.single(label, format!("{}{}", tokens::DISTRICT_PREFIX, district));
    }
    menu.single("Back to regions", tokens::BACK_TO_REGIONS)
        .single("Cancel", tokens::CANCEL)
}

/// Yes/no confirmation before overwriting a district that has data.
pub fn confirm_override() -> Menu {
    Menu::new()
        .single("Yes, override", tokens::OVERRIDE_YES)
        .single("No, go back", tokens::OVERRIDE_NO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_picker_tokens_carry_names() {
        let mut tally = Tally::new();
        tally.set("Banda", 1);
        tally.set("Dube", 2);
        let menu = entity_picker(&tally, tokens::EDIT_PREFIX);
        assert!(menu.tokens().contains(&"edit_Banda"));
        assert!(menu.tokens().contains(&"edit_Dube"));
        assert!(menu.tokens().contains(&tokens::BACK_EDIT_MENU));
    }

    #[test]
    fn districts_menu_annotates_submitted() {
        let catalog = Catalog::default_catalog();
        let submitted = vec!["mzimba".to_string()];
        let menu = districts(catalog, "Northern", &submitted);
        let labels: Vec<&str> = menu
            .rows()
            .iter()
            .flatten()
            .map(|b| b.label.as_str())
            .collect();
        assert!(labels.contains(&"Mzimba [has data]"));
        assert!(labels.contains(&"Chitipa"));
    }

    #[test]
    fn regions_menu_lists_all_regions() {
        let menu = regions(Catalog::default_catalog());
        assert!(menu.tokens().contains(&"region_Northern"));
        assert!(menu.tokens().contains(&"region_Central"));
        assert!(menu.tokens().contains(&"region_Southern"));
    }
}
