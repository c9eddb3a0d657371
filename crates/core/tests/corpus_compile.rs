//! End-to-end compilation of small on-disk interface corpora.

use ctxdoc_core::{compile, CommandDatabase, CompileError, CompilerConfig, ElementKind, Policy};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const NS: &str = r#"xmlns:cd="http://www.pragma-ade.com/commands""#;

fn write(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(
        path,
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<cd:interface {}>\n{}\n</cd:interface>\n",
            NS, body
        ),
    )
    .unwrap();
}

/// A corpus shaped like the ConTeXt distribution: common definitions, a
/// manifest pointing at per-topic files, and one module.
fn corpus() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "i-common-definitions.xml",
        r#"
  <cd:define name="keyword-name-optional">
    <cd:keywords optional="yes"><cd:constant type="cd:name"/></cd:keywords>
  </cd:define>
  <cd:define name="argument-content">
    <cd:content/>
  </cd:define>
  <cd:define name="assignment-framed-list">
    <cd:assignments list="yes" optional="yes">
      <cd:resolve name="assignment-framed-parameters"/>
      <cd:inherit name="setupframed"/>
    </cd:assignments>
  </cd:define>
  <cd:define name="assignment-framed-parameters">
    <cd:parameter name="frame"><cd:constant type="on"/><cd:constant type="off" default="yes"/></cd:parameter>
  </cd:define>
  <cd:define name="instance-framed">
    <cd:constant value="framed"/>
    <cd:constant value="framedtext"/>
  </cd:define>"#,
    );
    write(
        dir.path(),
        "i-context.xml",
        r#"
  <cd:interfacefile filename="i-framed.xml"/>
  <cd:interfacefile filename="i-structure.xml"/>"#,
    );
    write(
        dir.path(),
        "i-framed.xml",
        r#"
  <cd:command name="framed" file="pack-rul.mkiv">
    <cd:instances><cd:resolve name="instance-framed"/></cd:instances>
    <cd:arguments>
      <cd:resolve name="assignment-framed-list"/>
      <cd:resolve name="argument-content"/>
    </cd:arguments>
  </cd:command>
  <cd:command name="framed" file="pack-rul.mkiv">
    <cd:instances><cd:resolve name="instance-framed"/></cd:instances>
    <cd:arguments>
      <cd:resolve name="argument-content"/>
    </cd:arguments>
  </cd:command>
  <cd:command name="setupframed" file="pack-rul.mkiv">
    <cd:sequence><cd:string value="setup"/><cd:instance value="framed"/></cd:sequence>
    <cd:instances><cd:resolve name="instance-framed"/></cd:instances>
    <cd:arguments>
      <cd:resolve name="keyword-name-optional"/>
      <cd:resolve name="assignment-framed-list"/>
    </cd:arguments>
  </cd:command>"#,
    );
    write(
        dir.path(),
        "i-structure.xml",
        r#"
  <cd:command name="frob" type="environment" file="strc-frob.mkiv">
    <cd:arguments><cd:resolve name="keyword-name-optional"/></cd:arguments>
  </cd:command>
  <cd:command name="broken" file="strc-broken.mkiv">
    <cd:arguments><cd:bogus/></cd:arguments>
  </cd:command>"#,
    );
    write(
        dir.path(),
        "modules/t-extra.xml",
        r#"
  <cd:command name="extracommand" file="t-extra.mkiv">
    <cd:arguments><cd:csname/></cd:arguments>
  </cd:command>"#,
    );
    dir
}

fn build(dir: &TempDir, config: CompilerConfig) -> Result<CommandDatabase, CompileError> {
    compile(dir.path(), &config)
}

#[test]
fn tolerant_build_skips_only_the_broken_command() {
    let dir = corpus();
    let db = build(&dir, CompilerConfig::default()).unwrap();
    let names: Vec<&str> = db.names().collect();
    assert_eq!(
        names,
        vec![
            "framed",
            "framedtext",
            "setupframed",
            "setupframedtext",
            "startfrob",
            "stopfrob"
        ]
    );
}

#[test]
fn strict_build_aborts_on_the_broken_command() {
    let dir = corpus();
    let config = CompilerConfig {
        policy: Policy::Strict,
        ..CompilerConfig::default()
    };
    let err = build(&dir, config).unwrap_err();
    assert_eq!(
        err,
        CompileError::UnexpectedTag {
            file: "i-structure.xml".to_string(),
            name: "broken".to_string(),
            tag: "bogus".to_string(),
        }
    );
}

#[test]
fn modules_are_included_on_request() {
    let dir = corpus();
    let config = CompilerConfig {
        include_modules: true,
        ..CompilerConfig::default()
    };
    let db = build(&dir, config).unwrap();
    assert!(db.get("extracommand").is_some());
    assert_eq!(db.arg_count("extracommand"), Some(1));
}

#[test]
fn framed_variants_merge_into_an_optional_assignment() {
    let dir = corpus();
    let db = build(&dir, CompilerConfig::default()).unwrap();
    let variants = db.variants("framed").unwrap();
    assert_eq!(variants.len(), 1, "mandatory/absent assignments collapse");
    let elements = &variants[0].elements;
    assert_eq!(elements.len(), 2);
    assert!(elements[0].optional);
    assert_eq!(elements[0].rendering, "[..,..=..,..]");
    assert_eq!(elements[0].inherits, vec!["setupframed".to_string()]);
    match &elements[0].kind {
        ElementKind::Assignments(map) => {
            assert_eq!(
                map["frame"],
                vec!["on".to_string(), "<u>off</u>".to_string()]
            );
        }
        other => panic!("expected assignments, got {:?}", other),
    }
    assert!(!elements[1].optional);

    let raw = build(
        &dir,
        CompilerConfig {
            simplify: false,
            ..CompilerConfig::default()
        },
    )
    .unwrap();
    assert_eq!(raw.variants("framed").unwrap().len(), 2);
    assert_eq!(raw.arg_count("framed"), db.arg_count("framed"));
}

#[test]
fn environment_pair_shares_attribution() {
    let dir = corpus();
    let db = build(&dir, CompilerConfig::default()).unwrap();
    let start = db.get("startfrob").unwrap();
    let stop = db.get("stopfrob").unwrap();
    assert_eq!(start.files, stop.files);
    assert_eq!(start.variants[0].elements.len(), 1 + 2);
    assert_eq!(start.variants[0].elements[2].rendering, "\\stopfrob");
    assert!(stop.variants[0].elements.is_empty());
    assert_eq!(db.arg_count("startfrob"), Some(1));
}

#[test]
fn index_and_detail_agree_on_names() {
    let dir = corpus();
    let db = build(&dir, CompilerConfig::default()).unwrap();
    let detail = db.to_detail_json();
    let index = db.to_index();
    assert_eq!(index.len(), detail.as_object().unwrap().len());
    assert!(index.contains(&"2:setupframed".to_string()));
    assert!(index.contains(&"0:stopfrob".to_string()));
}

#[test]
fn missing_common_definitions_fail_the_build() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "i-context.xml", "");
    let err = build(&dir, CompilerConfig::default()).unwrap_err();
    assert_eq!(
        err,
        CompileError::Locate {
            file: "i-common-definitions.xml".to_string()
        }
    );
}
