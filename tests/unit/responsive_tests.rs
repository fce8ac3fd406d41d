// Responsive attribute generation tests

use imagekit_url::responsive::{
    generate, select_candidates, Descriptor, ResponsiveRequest, Strategy,
};
use imagekit_url::{ImageKitError, SrcOptions, TransformationStep, UrlBuilder};
use rstest::rstest;

const ENDPOINT: &str = "https://ik.example.com/acct";

fn request() -> ResponsiveRequest {
    ResponsiveRequest::new(SrcOptions::new("/test.jpg", ENDPOINT))
}

fn url_for(width: u32) -> String {
    format!(
        "https://ik.example.com/acct/test.jpg?tr=w-{},c-at_max",
        width
    )
}

#[test]
fn test_density_strategy_picks_surrounding_breakpoints() {
    let req = request().width(400).device_breakpoints(vec![300, 500, 800]);
    let result = generate(&UrlBuilder::new(), &req).unwrap();

    assert_eq!(result.src, url_for(500));
    assert_eq!(
        result.src_set.as_deref(),
        Some(format!("{} 1x, {} 2x", url_for(300), url_for(500)).as_str())
    );
    assert_eq!(result.sizes, None);
}

#[test]
fn test_full_range_strategy_defaults_sizes() {
    let req = request()
        .device_breakpoints(vec![640, 750, 828])
        .image_breakpoints(vec![16, 32]);
    let result = generate(&UrlBuilder::new(), &req).unwrap();

    let src_set = result.src_set.unwrap();
    let entries: Vec<&str> = src_set.split(", ").collect();
    assert_eq!(
        entries,
        vec![
            format!("{} 640w", url_for(640)),
            format!("{} 750w", url_for(750)),
            format!("{} 828w", url_for(828)),
        ]
    );
    assert_eq!(result.src, url_for(828));
    assert_eq!(result.sizes.as_deref(), Some("100vw"));
}

#[test]
fn test_pixel_sizes_strategy_deduplicates_union() {
    let req = request()
        .sizes("400px")
        .device_breakpoints(vec![300, 500])
        .image_breakpoints(vec![500, 700]);

    let set = select_candidates(&req).unwrap();
    assert_eq!(set.strategy, Strategy::PixelSizes);
    let widths: Vec<u32> = set.candidates.iter().map(|c| c.width).collect();
    assert_eq!(widths, vec![300, 500, 700]);

    let result = generate(&UrlBuilder::new(), &req).unwrap();
    assert_eq!(result.sizes.as_deref(), Some("400px"));
    assert_eq!(result.src, url_for(700));
    assert_eq!(result.src_set.unwrap().matches("w, ").count(), 2);
}

#[test]
fn test_end_to_end_responsive_with_width() {
    let req = request()
        .width(800)
        .device_breakpoints(vec![640, 750, 828, 1080]);
    let result = generate(&UrlBuilder::new(), &req).unwrap();

    assert_eq!(result.src, url_for(828));
    assert_eq!(
        result.src_set.as_deref(),
        Some(format!("{} 1x, {} 2x", url_for(750), url_for(828)).as_str())
    );
}

#[rstest]
#[case(Some(400), None, Strategy::Density)]
#[case(None, None, Strategy::FullRange)]
#[case(None, Some("50vw"), Strategy::FullRange)]
#[case(Some(400), Some("(max-width: 600px) 100vw, 600px"), Strategy::FullRange)]
#[case(Some(400), Some("600px"), Strategy::PixelSizes)]
#[case(None, Some("600px"), Strategy::PixelSizes)]
#[case(Some(400), Some("100VW"), Strategy::FullRange)]
#[case(None, Some(".5vw"), Strategy::FullRange)]
fn test_strategy_selection(
    #[case] width: Option<u32>,
    #[case] sizes: Option<&str>,
    #[case] expected: Strategy,
) {
    let mut req = request();
    req.width = width;
    req.sizes = sizes.map(str::to_string);
    assert_eq!(select_candidates(&req).unwrap().strategy, expected);
}

#[rstest]
#[case(100, 300, Some(500))]
#[case(300, 300, Some(500))]
#[case(499, 300, Some(500))]
#[case(500, 500, Some(800))]
#[case(800, 800, None)]
#[case(2000, 800, None)]
fn test_density_pairs(#[case] width: u32, #[case] one_x: u32, #[case] two_x: Option<u32>) {
    let req = request().width(width).device_breakpoints(vec![800, 300, 500]);
    let set = select_candidates(&req).unwrap();

    assert_eq!(set.candidates[0].width, one_x);
    assert_eq!(set.candidates[0].descriptor, Descriptor::Density(1));
    match two_x {
        Some(w) => {
            assert_eq!(set.candidates.len(), 2);
            assert_eq!(set.candidates[1].width, w);
            assert_eq!(set.candidates[1].descriptor, Descriptor::Density(2));
        }
        None => assert_eq!(set.candidates.len(), 1),
    }
}

#[test]
fn test_descriptors_never_mixed() {
    for req in [
        request().width(700),
        request(),
        request().sizes("300px"),
        request().sizes("33vw"),
    ] {
        let src_set = generate(&UrlBuilder::new(), &req)
            .unwrap()
            .src_set
            .unwrap();
        let descriptors: Vec<char> = src_set
            .split(", ")
            .map(|entry| entry.chars().last().unwrap())
            .collect();
        assert!(
            descriptors.iter().all(|&d| d == 'w') || descriptors.iter().all(|&d| d == 'x'),
            "mixed descriptors in {}",
            src_set
        );
    }
}

#[test]
fn test_caller_transformations_are_kept_before_width_step() {
    let req = ResponsiveRequest::new(
        SrcOptions::new("/test.jpg", ENDPOINT)
            .transformation(TransformationStep::new().with("effect_gray", true)),
    )
    .device_breakpoints(vec![640, 750])
    .image_breakpoints(Vec::new());

    let result = generate(&UrlBuilder::new(), &req).unwrap();
    assert_eq!(
        result.src,
        "https://ik.example.com/acct/test.jpg?tr=e-grayscale:w-750,c-at_max"
    );
}

#[test]
fn test_no_breakpoints_is_invalid_input() {
    let req = request()
        .device_breakpoints(Vec::new())
        .image_breakpoints(Vec::new());
    let err = generate(&UrlBuilder::new(), &req).unwrap_err();
    assert!(matches!(err, ImageKitError::InvalidInput { .. }));
}

#[test]
fn test_invalid_path_propagates() {
    let req = ResponsiveRequest::new(SrcOptions::new("", ENDPOINT));
    assert!(generate(&UrlBuilder::new(), &req).is_err());
}
