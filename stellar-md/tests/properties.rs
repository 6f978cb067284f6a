//! Property-based tests using proptest.
//!
//! These tests verify that rendering never panics on arbitrary input, is
//! deterministic, and keeps the structural counts authors rely on.

use proptest::prelude::*;

proptest! {
    /// Any random string fed to the renderer should never cause a panic.
    #[test]
    fn any_input_no_panic(input in "\\PC{0,500}") {
        let result = stellar_md::Renderer::new().render(&input);
        let _ = result.html.len();
        let _ = stellar_md::check(&input).len();
    }

    /// Tag-heavy input exercises the tokenizer's error paths.
    #[test]
    fn tag_soup_no_panic(
        parts in prop::collection::vec(
            prop_oneof![
                Just("{% note %}"),
                Just("{% endnote %}"),
                Just("{% tabs %}"),
                Just("{% endtabs %}"),
                Just("<!-- tab X -->"),
                Just("{% grid c:2 %}"),
                Just("{% endgrid %}"),
                Just("<!-- cell -->"),
                Just("{% timeline %}"),
                Just("- **h** x"),
                Just("{% endtimeline %}"),
                Just("{% button a /b %}"),
                Just("```"),
                Just("{%"),
                Just("%}"),
                Just("\n"),
                Just("text"),
            ],
            0..40,
        )
    ) {
        let input = parts.join("\n");
        let _ = stellar_md::render(&input);
    }

    /// Identical input always yields identical output.
    #[test]
    fn rendering_is_deterministic(input in "\\PC{0,300}") {
        prop_assert_eq!(stellar_md::render(&input), stellar_md::render(&input));
    }

    /// One cell wrapper per non-empty cell segment.
    #[test]
    fn grid_cell_count(cells in prop::collection::vec("[a-z]{0,8}", 0..8)) {
        let body: String = cells.iter().map(|c| format!("<!-- cell -->\n{c}\n")).collect();
        let input = format!("{{% grid %}}\n{body}{{% endgrid %}}");
        let html = stellar_md::render(&input);
        let expected = cells.iter().filter(|c| !c.is_empty()).count();
        prop_assert_eq!(html.matches("<div class=\"cell\">").count(), expected);
    }

    /// N tab markers give N nav entries and N panes, exactly one of each active.
    #[test]
    fn tab_counts(titles in prop::collection::vec("[A-Za-z]{1,8}", 1..6)) {
        let body: String = titles
            .iter()
            .map(|t| format!("<!-- tab {t} -->\ncontent {t}\n"))
            .collect();
        let input = format!("{{% tabs %}}\n{body}{{% endtabs %}}");
        let html = stellar_md::render(&input);
        prop_assert_eq!(html.matches("<a class=\"nav-tab").count(), titles.len());
        prop_assert_eq!(html.matches("class=\"tab-pane").count(), titles.len());
        prop_assert_eq!(html.matches("class=\"nav-tab active\"").count(), 1);
        prop_assert_eq!(html.matches("class=\"tab-pane active\"").count(), 1);
    }

    /// A URL token never leaks into a button's visible label.
    #[test]
    fn button_label_excludes_url(
        label in "[A-Za-z]{1,10}( [A-Za-z]{1,10}){0,2}",
        path in "[a-z]{1,10}",
        absolute in any::<bool>(),
    ) {
        let url = if absolute {
            format!("https://example.com/{path}")
        } else {
            format!("/{path}")
        };
        let html = stellar_md::render(&format!("{{% button {label} {url} %}}"));
        let expected_label = format!("<span>{label}</span>");
        prop_assert!(html.contains(&expected_label), "{}", html);
        let expected_href = format!("href=\"{url}\"");
        prop_assert!(html.contains(&expected_href), "{}", html);
    }

    /// Only a recognized first word becomes the note color.
    #[test]
    fn note_color_attribute(word in "[a-z]{1,8}") {
        let html = stellar_md::render(&format!("{{% note {word} Title %}}\nx\n{{% endnote %}}"));
        let expected = if stellar_md::args::NOTE_COLORS.contains(&word.as_str()) {
            word.clone()
        } else {
            "default".to_string()
        };
        let expected_attr = format!("color=\"{expected}\"");
        prop_assert!(html.contains(&expected_attr), "{}", html);
    }
}
