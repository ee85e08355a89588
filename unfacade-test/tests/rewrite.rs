use std::path::{Path, PathBuf};

use unfacade_core::error::RuleError;
use unfacade_graphs::{LanguageRegistry, LanguageSupport};
use unfacade_test::TestProject;

const APP: &str = "modules/@angular/core/src/app.ts";

// ── isBlank / isPresent ──────────────────────────────────────────

#[test]
fn aliased_facade_import_is_rewritten_and_local_helper_is_not() {
    let project = TestProject::new();
    project.write(
        "modules/@angular/core/src/util.ts",
        "export function isBlank(x: any): boolean { return !x; }\n",
    );
    project.write(
        APP,
        "\
import { isBlank as blank } from '../../facade/src/lang';
import { isBlank } from './util';

class Foo {}
export function check(foo: Foo): boolean {
  const a = blank(foo);
  const b = isBlank(foo);
  return a && b;
}
",
    );

    let fixed = project.fix(APP).unwrap();
    assert!(fixed.contains("const a = !foo;"));
    assert!(fixed.contains("const b = isBlank(foo);"));
}

#[test]
fn present_coercion_depends_on_context() {
    let project = TestProject::with_file(
        APP,
        "\
import { isPresent } from '@angular/facade/src/lang';

export function run(config: {debug: boolean} | null, items: string[]) {
  if (isPresent(items)) {
    log(isPresent(items));
  }
  return isPresent(config) ? config : {debug: false};
}
",
    );

    let fixed = project.fix(APP).unwrap();
    assert!(fixed.contains("  if (items) {\n"));
    assert!(fixed.contains("    log(!!items);\n"));
    // `{...} | null` is not object-like as a whole, so it stays
    assert!(fixed.contains("return isPresent(config) ?"));
}

#[test]
fn primitive_arguments_are_never_reported() {
    let project = TestProject::with_file(
        APP,
        "\
import { isBlank, isPresent } from '@angular/facade/src/lang';

export function f(s: string, n: number, flag: boolean, u: any) {
  return isBlank(s) || isBlank(n) || isPresent(flag) || isPresent(u) || isBlank(null);
}
",
    );

    let (_, report) = project.analyze().unwrap();
    assert_eq!(report.failure_count(), 0);
}

#[test]
fn operator_argument_keeps_its_parentheses() {
    let project = TestProject::with_file(
        APP,
        "\
import { isBlank } from '@angular/facade/src/lang';
const a = {};
const b = {};
export const none = isBlank(a || b);
",
    );

    let fixed = project.fix(APP).unwrap();
    let last = fixed.lines().last().unwrap();
    insta::assert_snapshot!(last, @"export const none = !(a || b);");
}

// ── StringMapWrapper ─────────────────────────────────────────────

#[test]
fn string_map_wrapper_members_are_translated() {
    let project = TestProject::with_file(
        APP,
        "\
import { StringMapWrapper } from '@angular/facade/src/collection';

export function stats(m: {[k: string]: number}) {
  const copy = StringMapWrapper.create();
  const has = StringMapWrapper.contains(m, 'a');
  const ks = StringMapWrapper.keys(m);
  const vs = StringMapWrapper.values(m);
  const empty = StringMapWrapper.isEmpty(m);
  StringMapWrapper.forEach(m, (value, key) => {
    copy[key] = value;
  });
  return [copy, has, ks, vs, empty];
}
",
    );

    let fixed = project.fix(APP).unwrap();
    let expected = "\
import { StringMapWrapper } from '@angular/facade/src/collection';

export function stats(m: {[k: string]: number}) {
  const copy = {};
  const has = m.hasOwnProperty('a');
  const ks = Object.keys(m);
  const vs = Object.keys(m).map(k => m[k]);
  const empty = Object.keys(m).length === 0;
  Object.keys(m).forEach(key => { const value = m[key]; copy[key] = value; });
  return [copy, has, ks, vs, empty];
}
";
    assert_eq!(fixed, expected);
}

#[test]
fn merge_and_equals_are_flagged_without_fix() {
    let project = TestProject::with_file(
        APP,
        "\
import { StringMapWrapper } from '@angular/facade/src/collection';
export const same = StringMapWrapper.equals(a, b);
export const both = StringMapWrapper.merge(a, b);
",
    );

    let (_, report) = project.analyze().unwrap();
    assert_eq!(report.failure_count(), 2);
    assert_eq!(report.fixable_count(), 0);

    let json = serde_json::to_value(&report).unwrap();
    let first = &json["files"][0]["failures"][0];
    assert_eq!(first["rule"], "string-map-wrapper");
    assert_eq!(first["file"], APP);
    assert!(first["fix"].is_null());
}

#[test]
fn unsupported_member_fails_only_its_file() {
    let project = TestProject::new();
    project.write(
        "modules/@angular/core/src/bad.ts",
        "import { StringMapWrapper } from '@angular/facade/src/collection';\nStringMapWrapper.clear(m);\n",
    );
    project.write(
        APP,
        "import { StringMapWrapper } from '@angular/facade/src/collection';\nexport const m = StringMapWrapper.create();\n",
    );

    let (_, report) = project.analyze().unwrap();
    assert_eq!(report.errors.len(), 1);
    assert_eq!(
        report.errors[0].error,
        RuleError::UnsupportedMember {
            file: "modules/@angular/core/src/bad.ts".into(),
            member: "clear".into(),
            call_text: "StringMapWrapper.clear(m)".into(),
        }
    );
    assert_eq!(report.failure_count(), 1);
}

// ── Resolution ───────────────────────────────────────────────────

#[test]
fn barrel_re_exports_and_namespace_imports_resolve() {
    let project = TestProject::new();
    project.write(
        "modules/@angular/facade/index.ts",
        "export { isBlank } from './src/lang';\nexport { StringMapWrapper as Maps } from './src/collection';\n",
    );
    project.write(
        APP,
        "\
import { isBlank, Maps } from '@angular/facade';
import * as collection from '@angular/facade/src/collection';
const o = {};
export const a = isBlank(o);
export const b = Maps.keys(o);
export const c = collection.StringMapWrapper.keys(o);
",
    );

    let fixed = project.fix(APP).unwrap();
    assert!(fixed.contains("export const a = !o;"));
    assert!(fixed.contains("export const b = Object.keys(o);"));
    assert!(fixed.contains("export const c = Object.keys(o);"));
}

// ── Fix application ──────────────────────────────────────────────

#[test]
fn nested_wrapper_calls_converge_over_two_runs() {
    let project = TestProject::with_file(
        APP,
        "import { StringMapWrapper } from '@angular/facade/src/collection';\nexport const n = StringMapWrapper.isEmpty(StringMapWrapper.create());\n",
    );

    let (_, report) = project.analyze().unwrap();
    let messages: Vec<_> = report.failures().map(|f| f.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "inline usages of StringMapWrapper (nested facade call; fix withheld)",
            "inline usages of StringMapWrapper",
        ]
    );

    let once = project.fix(APP).unwrap();
    assert!(once.contains("StringMapWrapper.isEmpty({})"));
    let twice = project.fix(APP).unwrap();
    assert!(twice.contains("export const n = Object.keys({}).length === 0;"));
}

#[test]
fn fixed_sources_parse_cleanly_and_have_no_facade_calls_left() {
    let source = "\
import { isBlank, isPresent } from '@angular/facade/src/lang';
import { StringMapWrapper } from '@angular/facade/src/collection';

export class Registry {
  private entries: {[name: string]: Registry} = {};

  lookup(name: string, fallback: Registry): Registry {
    const found = this.entries[name] as Registry;
    if (isBlank(found as Registry)) {
      return fallback;
    }
    while (isPresent(fallback)) {
      StringMapWrapper.forEach(this.entries, (entry: Registry) => entry.lookup(name, fallback));
      break;
    }
    return isPresent(found as Registry) ? found : fallback;
  }
}
";
    let project = TestProject::with_file(APP, source);
    let fixed = project.fix(APP).unwrap();
    assert_ne!(fixed, source);

    let tree = LanguageRegistry::new()
        .for_file(Path::new(APP))
        .unwrap()
        .parse(&fixed, Path::new(APP))
        .unwrap();
    assert!(!tree.root_node().has_error(), "{fixed}");

    let (_, report) = project.analyze().unwrap();
    assert_eq!(report.failure_count(), 0, "{fixed}");
}

#[test]
fn config_file_limits_rules_and_files() {
    let project = TestProject::with_file(
        APP,
        "\
import { isBlank } from '@angular/facade/src/lang';
import { StringMapWrapper } from '@angular/facade/src/collection';
const o = {};
export const a = isBlank(o);
export const b = StringMapWrapper.keys(o);
",
    );
    project.write("legacy/old.ts", "import { isBlank } from '@angular/facade/src/lang';\nisBlank({});\n");
    project.write(
        "unfacade.toml",
        "[rules]\nenabled = [\"string-map-wrapper\"]\n\n[files]\nexclude = [\"legacy/**\"]\n",
    );

    let (model, report) = project.analyze().unwrap();
    assert!(model.project().file(Path::new("legacy/old.ts")).is_none());
    let rules: Vec<_> = report.failures().map(|f| f.rule.as_str()).collect();
    assert_eq!(rules, vec!["string-map-wrapper"]);
    assert_eq!(report.files[0].path, PathBuf::from(APP));
}
