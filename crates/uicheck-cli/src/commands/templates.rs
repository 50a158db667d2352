//! Files written by `uicheck init`.

/// Example config, with every option at its default value.
pub const CONFIG_TEMPLATE: &str = r#"# uicheck configuration
#
# Every option can also be set through a UICHECK_* environment variable
# (UICHECK_BASE_URL, UICHECK_JOBS, ...) or a `uicheck run` flag.
# Run `uicheck schema` for the full list.

# Base for relative `navigate` targets
baseUrl = "http://localhost:3000"

# How long actions wait for their target and assertions wait to hold
defaultTimeoutMs = 5000
pollIntervalMs = 100

# How long `click_if_visible` looks for its target (0 = check once)
probeTimeoutMs = 0

# Budget for one whole scenario, setup included
scenarioTimeoutMs = 60000

# Scenarios run concurrently, each in its own browser context
jobs = 1

screenshotOnFailure = true
artifactsDir = "uicheck-results"

headless = true
windowWidth = 1920
windowHeight = 1080
"#;

/// The storefront checkout check: dismiss the cookie banner on the home
/// page, open the product, pick a colour and print run, add to cart and
/// verify the cart.
pub const CHECKOUT_SCENARIO: &str = r##"name = "checkout"
description = "Add a red mug to the cart and verify its contents and total"
tags = ["smoke", "checkout"]

[params]
product = "Ceramic Modern Coffee Mug"
colour = "Red"
price = "€4.94 €494.14"
print_run = "100"
total = "€494.14"
# The cart entry is matched by its full text, which selects the entry
# container however the product name inside it is wrapped.
cart_entry = "Ceramic Modern Coffee Mug Deal Update to 25 extra for just €80.38 Product"

[[setup]]
kind = "navigate"
url = "/"

[[setup]]
kind = "interact"
action = "click_if_visible"
locator = { role = "button", name = "Accept all" }

[[steps]]
kind = "navigate"
url = "/en-ie/ceramicmoderncoffeemug"

[[steps]]
kind = "interact"
action = "click"
locator = { role = "link", name = "${colour}" }

[[steps]]
kind = "interact"
action = "click"
locator = { role = "link", name = "${price}" }

[[steps]]
kind = "interact"
action = "click"
locator = { role = "button", name = "Skip uploading, add to cart" }

[[steps]]
kind = "assert"
locator = { text = "${cart_entry}" }
expect = "visible"

[[steps]]
kind = "assert"
locator = { text = "${cart_entry}" }
expect = { contains_text = "${product}" }

[[steps]]
kind = "assert"
locator = [
    { text = "${cart_entry}" },
    { role = "row", name = "Print run" },
    { css = "td", nth = 1 },
]
expect = { contains_text = "${print_run}" }

[[steps]]
kind = "assert"
locator = [
    { text = "${cart_entry}" },
    { role = "row", name = "Colours" },
    { css = "td", nth = 1 },
]
expect = { contains_text = "${colour}" }

[[steps]]
kind = "interact"
action = "wait_for"
locator = { css = "#cart-summary" }

[[steps]]
kind = "assert"
locator = [
    { css = "#cart-summary" },
    { role = "row", name = "Total articles" },
    { css = "td", nth = 1 },
]
expect = { contains_text = "${total}" }
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UicheckConfig;
    use uicheck_core::{Action, Scenario, Step};

    #[test]
    fn config_template_is_the_default_config() {
        let config: UicheckConfig = toml::from_str(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, UicheckConfig::default());
    }

    #[test]
    fn checkout_template_is_valid() {
        let scenario = Scenario::from_toml_str(CHECKOUT_SCENARIO).unwrap();
        scenario.validate().unwrap();

        assert_eq!(scenario.setup.len(), 2);
        assert_eq!(scenario.steps.len(), 10);
        assert!(matches!(
            scenario.setup[1],
            Step::Interact {
                action: Action::ClickIfVisible,
                ..
            }
        ));

        let bound = scenario.bind(&Default::default()).unwrap();
        assert_eq!(
            bound.steps[2].to_string(),
            r#"click role=link[name="€4.94 €494.14"]"#
        );
        assert!(matches!(
            &bound.setup[0],
            Step::Navigate { url, .. } if url == "/"
        ));
        assert!(matches!(
            &bound.steps[0],
            Step::Navigate { url, .. } if url == "/en-ie/ceramicmoderncoffeemug"
        ));
    }
}
