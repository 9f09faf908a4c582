use std::fs;

use amdbundle::app::compile::compile_sources;
use amdbundle::domain::model::SourcePath;
use amdbundle::infra::config::CompileOptions;
use insta::assert_snapshot;

#[test]
fn named_bundle_renders() {
    let temp = tempfile::tempdir().expect("temp dir");
    let sources = [
        ("amd/common/Config.js", "var APP_CONFIG = { debug: false };\n"),
        (
            "amd/common/Page.js",
            "define(['common/Config'], function (Config) {\n    return { title: 'home' };\n});\n",
        ),
    ];

    let mut inputs = Vec::new();
    for (display, content) in sources {
        let absolute = temp.path().join(display);
        fs::create_dir_all(absolute.parent().unwrap()).unwrap();
        fs::write(&absolute, content).unwrap();
        inputs.push(SourcePath {
            display: display.to_owned(),
            absolute,
        });
    }

    let options = CompileOptions {
        root: "amd/".into(),
        var_name: Some("__FILE".into()),
        ..CompileOptions::default()
    };
    let output = temp.path().join("www/js/common.js");
    let result = compile_sources("common", &inputs, &options, &output).unwrap();

    assert_snapshot!("named_bundle", result.content);
}
