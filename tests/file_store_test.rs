//! Site file loading integration tests

use std::io::Write;
use std::sync::Arc;

use hostway::db::{MappingStore, SiteFixture};
use hostway::pipeline::{Pipeline, PipelineConfig};
use hostway::query::{ContentQuery, QueryFlag};
use hostway::request::RequestContext;
use hostway::unmapped::UnmappedOutcome;

const SITE: &str = r#"
[site]
base_url = "https://main.example/site"
home_path = ""
commerce_listing = 20

[settings]
rewrite_urls = true
rewrite_mode = "selective"
unmapped_handling = "redirect_to_primary"

[[mappings]]
id = 1
host = "Shop.Example"
favicon_ref = 5

[[mappings.values]]
object_type = "post"
object_id = 20
primary = true

[[mappings.values]]
object_type = "term"
object_id = 30

[[mappings]]
id = 2
host = "blog.example"
path = "/journal/"

[[mappings.values]]
object_type = "posts_homepage"
primary = true

[[objects]]
id = 20
content_type = "page"
slug = "store"

[[objects]]
id = 30
shape = "term"
content_type = "product_cat"
slug = "shoes"

[[assets]]
id = 5
url = "https://main.example/site/uploads/shop.ico"
"#;

fn write_site(raw: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(raw.as_bytes()).expect("write site file");
    file
}

#[test]
fn test_load_site_file() {
    let file = write_site(SITE);
    let fixture = SiteFixture::load(file.path()).expect("site loads");

    assert_eq!(fixture.base_url, "https://main.example/site");
    assert_eq!(fixture.store.mapping_count(), 2);

    let shop = fixture.store.find_mappings_by_host("shop.example").unwrap();
    assert_eq!(shop.len(), 1);
    assert_eq!(shop[0].host, "shop.example");
    assert_eq!(shop[0].favicon_ref, Some(5));

    let values = fixture.store.find_values_by_mapping(1).unwrap();
    assert_eq!(values.len(), 2);
    assert!(values.iter().all(|v| v.id > 0 && v.mapping_id == 1));

    let blog = fixture.store.find_mappings_by_host("blog.example").unwrap();
    assert_eq!(blog[0].path, "journal");

    assert_eq!(fixture.store.find_setting("rewrite_urls").unwrap().as_deref(), Some("1"));
}

#[test]
fn test_loaded_site_serves_requests() {
    let file = write_site(SITE);
    let fixture = SiteFixture::load(file.path()).unwrap();
    let config = PipelineConfig::new(&fixture.base_url).unwrap();
    let pipeline = Pipeline::new(fixture.store, Arc::new(fixture.content), config);

    // The commerce listing as primary value
    let base = pipeline.config().base.clone();
    let req = RequestContext::from_url("https://shop.example/page/2", base).unwrap();
    let mut query = ContentQuery::unresolved(&req);
    let resolution = pipeline.handle(&req, &mut query);
    let resolved = resolution.resolved().unwrap();
    assert!(resolved.is_mapped);
    assert!(query.is(QueryFlag::CommerceListing));
    assert_eq!(query.var("paged"), Some("2"));

    let rewriter = pipeline.rewriter(&req, resolved).unwrap();
    assert_eq!(
        rewriter.rewrite_link("https://main.example/site/store/"),
        "https://shop.example/"
    );
    assert_eq!(
        rewriter.rewrite_link("https://main.example/site/product_cat/shoes"),
        "https://shop.example/product_cat/shoes"
    );
    assert_eq!(
        rewriter.rewrite_link("https://main.example/site/contact"),
        "https://main.example/site/contact"
    );

    let head = pipeline.head_customizer(resolved, Some(&rewriter));
    let html = head.apply("<head></head>");
    assert!(html.contains(r#"href="https://shop.example/uploads/shop.ico""#));

    // Unclaimed path under a mapped host goes to the primary mapping
    let base = pipeline.config().base.clone();
    let req = RequestContext::from_url("https://blog.example/journal/nothing", base).unwrap();
    let mut query = ContentQuery::unresolved(&req);
    let resolution = pipeline.handle(&req, &mut query);
    let outcome = pipeline.finish(&req, resolution.resolved().unwrap(), &query);
    assert_eq!(outcome, UnmappedOutcome::redirect("https://blog.example/journal".to_string()));
}

#[test]
fn test_invalid_site_files() {
    let missing_site = write_site("[settings]\nrewrite_urls = true\n");
    assert!(SiteFixture::load(missing_site.path()).is_err());

    let duplicate = write_site(
        r#"
[site]
base_url = "https://main.example"

[[mappings]]
id = 1
host = "a.example"

[[mappings]]
id = 2
host = "A.example"
"#,
    );
    assert!(SiteFixture::load(duplicate.path()).is_err());

    assert!(SiteFixture::load("/nonexistent/hostway.toml").is_err());
}
