//! Integration tests for the expression builder and its wire output.

use serde_json::json;

use fauna_query::query::*;
use fauna_query::*;

// ─────────────────────── helpers ───────────────────────

fn widgets() -> Ref {
    Ref::new("classes/widgets")
}

fn by_n() -> Ref {
    Ref::new("indexes/widgets_by_n")
}

// ─────────────────────── lambdas ───────────────────────

#[test]
fn test_single_argument_lambda() {
    let lambda = lambda_query(|a| a);
    assert_eq!(
        to_json(&lambda),
        json!({"lambda": "auto0", "expr": {"var": "auto0"}})
    );
}

#[test]
fn test_nested_lambdas_continue_numbering() {
    let lambda = lambda_query(|a| lambda_query(|b| lambda_query(|c| vec![a, b, c])));
    assert_eq!(
        to_json(&lambda),
        json!({
            "lambda": "auto0",
            "expr": {
                "lambda": "auto1",
                "expr": {
                    "lambda": "auto2",
                    "expr": [{"var": "auto0"}, {"var": "auto1"}, {"var": "auto2"}]
                }
            }
        })
    );
}

#[test]
fn test_multi_argument_lambda() {
    let lambda = lambda_query2(|a, b| vec![b, a]);
    assert_eq!(
        to_json(&lambda),
        json!({"lambda": ["auto0", "auto1"], "expr": [{"var": "auto1"}, {"var": "auto0"}]})
    );
}

#[test]
fn test_dynamic_arity_matches_fixed() {
    let fixed = lambda_query3(|a, b, c| add((a, b, c)));
    let dynamic = lambda_query_n(3, add);
    assert_eq!(fixed, dynamic);
}

#[test]
fn test_numbering_restarts_after_failed_body() {
    let failed: Result<Expr, QueryError> = try_lambda_query(|a| {
        lambda_query(|b| vec![a, b]);
        Err::<Expr, _>(QueryError::MissingField("data"))
    });
    assert!(matches!(failed, Err(QueryError::MissingField("data"))));

    assert_eq!(
        to_json(&lambda_query(|a| a)),
        json!({"lambda": "auto0", "expr": {"var": "auto0"}})
    );
}

#[test]
fn test_sibling_lambdas_inside_one_body_do_not_collide() {
    let lambda = lambda_query(|a| vec![lambda_query(|b| b), lambda_query(|c| vec![a, c])]);
    assert_eq!(
        to_json(&lambda),
        json!({
            "lambda": "auto0",
            "expr": [
                {"lambda": "auto1", "expr": {"var": "auto1"}},
                {"lambda": "auto2", "expr": [{"var": "auto0"}, {"var": "auto2"}]}
            ]
        })
    );
}

// ─────────────────────── collections ───────────────────────

#[test]
fn test_map_with_closure_and_prebuilt_lambda() {
    let built = map_expr(|x| multiply([x, Expr::from(2)]), vec![1, 2, 3]);
    let prebuilt = map_with(lambda_query(|x| multiply([x, Expr::from(2)])), vec![1, 2, 3]);
    assert_eq!(built, prebuilt);
    assert_eq!(
        to_json(&built),
        json!({
            "map": {"lambda": "auto0", "expr": {"multiply": [{"var": "auto0"}, 2]}},
            "collection": [1, 2, 3]
        })
    );
}

#[test]
fn test_foreach_delete() {
    let refs = vec![widgets().child(1), widgets().child(2)];
    assert_eq!(
        to_json(&foreach(delete, refs)),
        json!({
            "foreach": {"lambda": "auto0", "expr": {"delete": {"var": "auto0"}}},
            "collection": [{"@ref": "classes/widgets/1"}, {"@ref": "classes/widgets/2"}]
        })
    );
}

#[test]
fn test_filter_take_drop_prepend_append() {
    let evens = filter_expr(|x| equals([modulo([x, Expr::from(2)]), Expr::from(0)]), vec![1, 2]);
    assert_eq!(
        to_json(&evens),
        json!({
            "filter": {
                "lambda": "auto0",
                "expr": {"equals": [{"modulo": [{"var": "auto0"}, 2]}, 0]}
            },
            "collection": [1, 2]
        })
    );
    assert_eq!(to_json(&take(2, vec![1, 2, 3])), json!({"take": 2, "collection": [1, 2, 3]}));
    assert_eq!(to_json(&drop(2, vec![1, 2, 3])), json!({"drop": 2, "collection": [1, 2, 3]}));
    assert_eq!(
        to_json(&prepend(vec![0], vec![1])),
        json!({"prepend": [0], "collection": [1]})
    );
    assert_eq!(
        to_json(&append(vec![2], vec![1])),
        json!({"append": [2], "collection": [1]})
    );
}

// ─────────────────────── basic forms ───────────────────────

#[test]
fn test_quote_is_not_an_object() {
    let data = json!({"name": "widget", "tags": ["a", "b"]});
    let quoted = quote(data.clone());
    let evaluated = object([("name", Expr::from("widget")), ("tags", Expr::from(["a", "b"]))]);

    assert_ne!(quoted, evaluated);
    assert_eq!(quoted.as_quoted(), Some(&data));
    assert_eq!(to_json(&quoted), json!({"quote": data}));
    assert_eq!(
        to_json(&evaluated),
        json!({"object": {"name": "widget", "tags": ["a", "b"]}})
    );
}

#[test]
fn test_let_and_do() {
    let expr = let_expr([("x", 1), ("y", 2)], do_expr((var("x"), var("y"))));
    assert_eq!(
        to_json(&expr),
        json!({"let": {"x": 1, "y": 2}, "in": {"do": [{"var": "x"}, {"var": "y"}]}})
    );
}

#[test]
fn test_explicit_lambda_names() {
    assert_eq!(
        to_json(&lambda_expr(["a", "b"], var("a"))),
        json!({"lambda": ["a", "b"], "expr": {"var": "a"}})
    );
}

// ─────────────────────── varargs and paths ───────────────────────

#[test]
fn test_varargs_spellings_yield_same_tree() {
    let tuple = add((1, 2, 3));
    assert_eq!(tuple, add([1, 2, 3]));
    assert_eq!(tuple, add(vec![1, 2, 3]));
    assert_eq!(tuple, add(Expr::from(vec![1, 2, 3])));
    assert_eq!(to_json(&tuple), json!({"add": [1, 2, 3]}));
}

#[test]
fn test_varargs_single_var_is_spread_by_server() {
    assert_eq!(to_json(&add(var("xs"))), json!({"add": {"var": "xs"}}));
}

#[test]
fn test_single_key_path_normalizes() {
    let from = var("doc");
    assert_eq!(select("data", from.clone()), select(["data"], from.clone()));
    assert_eq!(
        to_json(&select("data", from.clone())),
        json!({"select": ["data"], "from": {"var": "doc"}})
    );
    assert_eq!(contains("data", from.clone()), contains(vec!["data"], from.clone()));
    assert_eq!(
        to_json(&contains(("data", 0), from.clone())),
        json!({"contains": ["data", 0], "in": {"var": "doc"}})
    );
    assert_eq!(
        to_json(&select_with_default("n", from, 0)),
        json!({"select": ["n"], "from": {"var": "doc"}, "default": 0})
    );
}

// ─────────────────────── reads and writes ───────────────────────

#[test]
fn test_paginate_sends_only_given_options() {
    let set = match_expr(1, by_n());
    assert_eq!(
        to_json(&paginate(set.clone())),
        json!({"paginate": {"match": 1, "index": {"@ref": "indexes/widgets_by_n"}}})
    );

    let options = PaginateOptions::new()
        .after(vec![widgets().child(2)])
        .size(10)
        .events(true);
    let json = to_json(&paginate_with(set, options));
    assert_eq!(json["size"], json!(10));
    assert_eq!(json["events"], json!(true));
    assert_eq!(json["after"], json!([{"@ref": "classes/widgets/2"}]));
    assert!(json.get("before").is_none());
    assert!(json.get("ts").is_none());
    assert!(json.get("sources").is_none());
}

#[test]
fn test_point_in_time_reads() {
    let r = widgets().child(1);
    assert_eq!(to_json(&get(r.clone())), json!({"get": {"@ref": "classes/widgets/1"}}));
    assert_eq!(
        to_json(&get_at(r.clone(), 5)),
        json!({"get": {"@ref": "classes/widgets/1"}, "ts": 5})
    );
    assert_eq!(
        to_json(&exists_at(r, time("now"))),
        json!({"exists": {"@ref": "classes/widgets/1"}, "ts": {"time": "now"}})
    );
    assert_eq!(
        to_json(&count_events(match_expr(1, by_n()), true))["events"],
        json!(true)
    );
}

#[test]
fn test_create_update_replace() {
    let params = object([("data", object([("n", 1)]))]);
    assert_eq!(
        to_json(&create(widgets(), params.clone())),
        json!({"create": {"@ref": "classes/widgets"}, "params": {"object": {"data": {"object": {"n": 1}}}}})
    );
    let r = widgets().child(1);
    assert_eq!(to_json(&update(r.clone(), params.clone()))["update"], json!({"@ref": "classes/widgets/1"}));
    assert_eq!(to_json(&replace(r, params))["replace"], json!({"@ref": "classes/widgets/1"}));
}

#[test]
fn test_insert_and_remove_accept_events() {
    let r = widgets().child(1);
    let event = Event::new(r.clone(), 1_000, Action::Create);
    let params = object([("data", object([("n", 1)]))]);

    assert_eq!(
        insert(r.clone(), 1_000, Action::Create, params.clone()),
        insert_event(event.clone(), params.clone())
    );
    assert_eq!(remove(r, 1_000, Action::Create), remove_event(event.clone()));
    assert_eq!(
        to_json(&remove_event(event)),
        json!({"remove": {"@ref": "classes/widgets/1"}, "ts": 1000, "action": "create"})
    );
}

// ─────────────────────── sets, strings, time ───────────────────────

#[test]
fn test_set_algebra_and_join() {
    let a = match_expr(1, by_n());
    let b = match_expr(2, by_n());
    assert_eq!(
        to_json(&difference((a.clone(), b.clone())))["difference"][1],
        json!({"match": 2, "index": {"@ref": "indexes/widgets_by_n"}})
    );
    assert_eq!(intersection([a.clone(), b.clone()]), intersection(vec![a.clone(), b]));

    let joined = join(a.clone(), |n| match_expr(n, by_n()));
    assert_eq!(
        to_json(&joined),
        json!({
            "join": {"match": 1, "index": {"@ref": "indexes/widgets_by_n"}},
            "with": {"lambda": "auto0", "expr": {"match": {"var": "auto0"}, "index": {"@ref": "indexes/widgets_by_n"}}}
        })
    );
    assert_eq!(
        to_json(&join_with(a, Ref::new("indexes/widgets_by_owner")))["with"],
        json!({"@ref": "indexes/widgets_by_owner"})
    );
}

#[test]
fn test_strings_and_time() {
    assert_eq!(to_json(&casefold("Hen Wen")), json!({"casefold": "Hen Wen"}));
    assert_eq!(
        to_json(&concat_with_separator(vec!["a", "b"], "-")),
        json!({"concat": ["a", "b"], "separator": "-"})
    );
    assert_eq!(
        to_json(&epoch(12, TimeUnit::Second)),
        json!({"epoch": 12, "unit": "second"})
    );
    assert_eq!(to_json(&date("1970-01-01")), json!({"date": "1970-01-01"}));
}

#[test]
fn test_logic_forms() {
    assert_eq!(
        to_json(&if_expr(and_expr((true, false)), or_expr([true]), not_expr(true))),
        json!({"if": {"and": [true, false]}, "then": {"or": [true]}, "else": {"not": true}})
    );
    assert_eq!(to_json(&subtract((3, 1))), json!({"subtract": [3, 1]}));
    assert_eq!(to_json(&divide((4, 2))), json!({"divide": [4, 2]}));
}

// ─────────────────────── replies ───────────────────────

#[test]
fn test_reply_values_feed_new_queries() {
    let reply = r#"{"data": [{"@ref": "classes/widgets/1"}], "after": [{"@ref": "classes/widgets/2"}]}"#;
    let page = Page::from_value(decode_str(reply).unwrap()).unwrap();

    let next = paginate_with(
        match_expr(1, by_n()),
        PaginateOptions::new().after(page.after.clone().unwrap()),
    );
    assert_eq!(to_json(&next)["after"], json!([{"@ref": "classes/widgets/2"}]));

    let first = page.data[0].as_reference().unwrap().clone();
    assert_eq!(to_json(&get(first)), json!({"get": {"@ref": "classes/widgets/1"}}));
}

#[test]
fn test_event_pages_decode_to_events() {
    let reply = json!({
        "data": [{"resource": {"@ref": "classes/widgets/1"}, "ts": 1000, "action": "create"}]
    });
    let page = Page::from_value(decode(reply).unwrap()).unwrap();
    let events = page.try_map_data(|v| Event::from_value(&v)).unwrap();
    assert_eq!(events.data, vec![Event::new(widgets().child(1), 1_000, Action::Create)]);
}

#[test]
fn test_wire_string_honors_style() {
    let expr = get(widgets().child(1));
    assert_eq!(
        to_wire_string(&expr, resolve_wire_style(Some("compact"))).unwrap(),
        r#"{"get":{"@ref":"classes/widgets/1"}}"#
    );
}

#[test]
fn test_quoted_data_holds_wrapped_values() {
    let referenced = widgets().child(7);
    let at = FaunaTime::parse("2016-01-01T00:00:00Z").unwrap();
    let params = quote(json!({"data": {"m": referenced, "at": at}}));
    assert_eq!(
        to_json(&create(widgets(), params)),
        json!({
            "create": {"@ref": "classes/widgets"},
            "params": {"quote": {"data": {
                "m": {"@ref": "classes/widgets/7"},
                "at": {"@ts": "2016-01-01T00:00:00Z"}
            }}}
        })
    );
}

#[test]
fn test_sourced_page_sets_equal_local_queries() {
    let reply = json!({
        "data": [{
            "sources": [{"@set": {
                "match": {"@ts": "2016-01-01T00:00:00.000000Z"},
                "index": {"@ref": "indexes/widgets_by_ts"}
            }}],
            "value": {"@ref": "classes/widgets/1"}
        }]
    });
    let page = Page::from_value(decode(reply).unwrap())
        .unwrap()
        .try_map_data(SourcedValue::from_value)
        .unwrap();

    let local = Set::new(match_expr(
        FaunaTime::parse("2016-01-01T00:00:00Z").unwrap(),
        Ref::new("indexes/widgets_by_ts"),
    ));
    assert_eq!(page.data[0].sources, vec![local]);
}
