use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::browser::Locator;
use crate::browser::testing::{FakePage, FakeSession};
use crate::config::Config;
use crate::extractor::{
    ExtractorSettings, PageExtractor, UNDETERMINED_CATEGORY, UNKNOWN_NAME,
};

const LISTING_URL: &str = "https://www.google.com/maps/place/Example+Pharmacy/@24.71,46.67,17z";

fn test_settings(config: &Config) -> ExtractorSettings {
    let mut settings = ExtractorSettings::from_config(config);
    settings.settle_delay = Duration::ZERO;
    settings.heading_wait = Duration::ZERO;
    settings.selector_wait = Duration::ZERO;
    settings.consent_timeout = Duration::ZERO;
    settings.reviews = settings.reviews.immediate();
    settings
}

fn pharmacy_page() -> FakePage {
    FakePage::default()
        .with(&Locator::css("h1"), &["Example Pharmacy"])
        .with(&Locator::attr_contains("jsaction", "category"), &["Pharmacy"])
        .with(&Locator::aria_label("Reviews"), &["Reviews"])
        .with(
            &Locator::css(".wiI7pd"),
            &["Great service", "Fast", "24 items always in stock"],
        )
        .with(
            &Locator::css("body"),
            &["Example Pharmacy\n\n4.6\nPharmacy\n\nOpen 24 hours"],
        )
        .with_title("Example Pharmacy - Google Maps")
        .with_markup(r#"<html><script>var d=[\"Pharmacy\",\"Drug Store\"];</script></html>"#)
}

#[tokio::test]
async fn test_extract_full_listing() {
    let config = Config::default();
    let extractor = PageExtractor::new(test_settings(&config));
    let session = FakeSession::new(pharmacy_page());

    let result = extractor.extract(&session, LISTING_URL).await.unwrap();

    assert_eq!(result.name, "Example Pharmacy");
    assert_eq!(result.category, "Pharmacy");
    assert_eq!(
        result.review_text,
        "Great service Fast 24 items always in stock"
    );
    assert_eq!(
        result.visible_text,
        "Example Pharmacy\n4.6\nPharmacy\nOpen 24 hours"
    );
    assert!(result.raw_markup.contains("Drug Store"));
    assert!(result.screenshot.is_none());
    assert_eq!(session.state.visited.lock().unwrap().as_slice(), [LISTING_URL]);
}

#[tokio::test]
async fn test_every_field_degrades_independently() {
    let config = Config::default();
    let extractor = PageExtractor::new(test_settings(&config));
    let session = FakeSession::new(FakePage::default());

    let result = extractor.extract(&session, LISTING_URL).await.unwrap();

    assert_eq!(result.name, UNKNOWN_NAME);
    assert_eq!(result.category, UNDETERMINED_CATEGORY);
    assert!(result.review_text.is_empty());
    assert!(result.visible_text.is_empty());
    assert!(result.raw_markup.is_empty());
}

#[tokio::test]
async fn test_missing_reviews_keep_other_fields() {
    let config = Config::default();
    let extractor = PageExtractor::new(test_settings(&config));
    let session = FakeSession::new(
        FakePage::default()
            .with(&Locator::css("h1"), &["Corner Cafe"])
            .with(
                &Locator::next_sibling_of(Locator::css("h1")),
                &["4.1\nCoffee shop"],
            ),
    );

    let result = extractor.extract(&session, LISTING_URL).await.unwrap();

    assert_eq!(result.name, "Corner Cafe");
    assert_eq!(result.category, "Coffee shop");
    assert!(result.review_text.is_empty());
}

#[tokio::test]
async fn test_diagnostic_screenshot_when_heading_missing() {
    let config = Config::default().with_diagnostic_mode(true);
    let extractor = PageExtractor::new(test_settings(&config));
    let session =
        FakeSession::new(FakePage::default().with_title("Example Pharmacy - Google Maps"));

    let result = extractor.extract(&session, LISTING_URL).await.unwrap();

    assert_eq!(result.name, "Example Pharmacy");
    assert!(result.screenshot.is_some());
    assert_eq!(session.state.screenshots.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_no_screenshot_outside_diagnostic_mode() {
    let config = Config::default();
    let extractor = PageExtractor::new(test_settings(&config));
    let session = FakeSession::new(FakePage::default());

    let result = extractor.extract(&session, LISTING_URL).await.unwrap();

    assert!(result.screenshot.is_none());
    assert_eq!(session.state.screenshots.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_screenshot_when_heading_found() {
    let config = Config::default().with_diagnostic_mode(true);
    let extractor = PageExtractor::new(test_settings(&config));
    let session = FakeSession::new(pharmacy_page());

    let result = extractor.extract(&session, LISTING_URL).await.unwrap();

    assert!(result.screenshot.is_none());
}

#[tokio::test]
async fn test_consent_dialog_dismissed() {
    let config = Config::default();
    let extractor = PageExtractor::new(test_settings(&config));
    let session = FakeSession::new(
        pharmacy_page().with(&Locator::text_contains("button", "Accept all"), &["Accept all"]),
    );

    extractor.extract(&session, LISTING_URL).await.unwrap();

    assert_eq!(session.state.clicked()[0], "text:button~Accept all");
}

#[tokio::test]
async fn test_review_text_respects_budget() {
    let config = Config::default().with_char_budget(10);
    let extractor = PageExtractor::new(test_settings(&config));
    let session = FakeSession::new(pharmacy_page());

    let result = extractor.extract(&session, LISTING_URL).await.unwrap();

    assert_eq!(result.review_text, "Great serv");
    assert!(result.visible_text.chars().count() <= 10);
}

#[tokio::test]
async fn test_navigation_failure_is_fatal() {
    let config = Config::default();
    let extractor = PageExtractor::new(test_settings(&config));
    let mut page = pharmacy_page();
    page.fail_navigation = true;
    let session = FakeSession::new(page);

    let err = extractor.extract(&session, LISTING_URL).await.unwrap_err();

    assert!(err.is_session_fatal());
}
