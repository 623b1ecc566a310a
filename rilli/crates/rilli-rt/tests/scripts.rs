//! Whole-script behaviour tests through the public runtime API.

use rilli_rt::{ErrorKind, ScriptError, ScriptRuntime, Value};

/// Run a script and return the final stack top-down, formatted.
fn run(source: &str) -> Vec<String> {
    let mut runtime = ScriptRuntime::new();
    runtime
        .run_script(source)
        .unwrap_or_else(|err| panic!("script failed: {err}\n  source: {source}"));
    runtime.iter_stack().iter().map(Value::format).collect()
}

fn run_err(source: &str) -> ScriptError {
    let mut runtime = ScriptRuntime::new();
    runtime
        .run_script(source)
        .expect_err("script should have failed")
}

// Arithmetic and comparison

#[test]
fn test_add() {
    assert_eq!(run("1 1 +"), ["2"]);
}

#[test]
fn test_arithmetic_inside_array_literal() {
    assert_eq!(run("[ 1 2 3 - 4 5 6 7 + ]"), ["[1 -1 4 5 13]"]);
}

#[test]
fn test_float_coercion() {
    assert_eq!(run("1 2.0 +"), ["3.0"]);
    assert_eq!(run("1 2 + 0.5 *"), ["1.5"]);
}

#[test]
fn test_integer_division_truncates() {
    assert_eq!(run("7 2 /"), ["3"]);
    assert_eq!(run("0 7 - 2 /"), ["-3"]);
}

#[test]
fn test_modulo_floors() {
    assert_eq!(run("7 3 %"), ["1"]);
    assert_eq!(run("0 7 - 3 %"), ["2"]);
}

#[test]
fn test_pow() {
    assert_eq!(run("2 10 **"), ["1024"]);
    assert_eq!(run("2.0 0.5 **"), [format!("{}", 2f64.powf(0.5))]);
}

#[test]
fn test_big_integers() {
    assert_eq!(
        run("99999999999999999999 1 +"),
        ["100000000000000000000"]
    );
}

#[test]
fn test_comparisons() {
    assert_eq!(run("1 2 <"), ["true"]);
    assert_eq!(run("2 2 <="), ["true"]);
    assert_eq!(run("1 2 >"), ["false"]);
    assert_eq!(run("2 2 >="), ["true"]);
}

#[test]
fn test_float_equality_epsilon() {
    assert_eq!(run("0.1 0.2 + 0.3 ="), ["true"]);
    assert_eq!(run("0.1 0.2 + 0.4 ~="), ["true"]);
}

#[test]
fn test_bitwise() {
    assert_eq!(run("6 3 &"), ["2"]);
    assert_eq!(run("6 3 |"), ["7"]);
    assert_eq!(run("6 3 ^"), ["5"]);
    assert_eq!(run("8 2 >>"), ["2"]);
    assert_eq!(run("5 ~"), ["-6"]);
}

#[test]
fn test_bool_logic() {
    assert_eq!(run("true false &"), ["false"]);
    assert_eq!(run("true false |"), ["true"]);
    assert_eq!(run("true true ^"), ["false"]);
}

// Stack manipulation

#[test]
fn test_dup_drop_break() {
    assert_eq!(run("7 .."), ["7", "7"]);
    assert_eq!(run("1 2 ,"), ["1"]);
    assert_eq!(run("1 2 3 ;"), Vec::<String>::new());
}

#[test]
fn test_inspect() {
    assert_eq!(run("[ 1 2 ] `"), ["'[1 2]'"]);
    assert_eq!(run("2.5 `"), ["'2.5'"]);
}

#[test]
fn test_inspect_eval_round_trip() {
    assert_eq!(run("[ 1 2 ] ` !"), ["[1 2]"]);
    assert_eq!(run("{ 1 2 + } ` !"), ["{ 1 2 + }"]);
}

#[test]
fn test_collect() {
    assert_eq!(run("1 2 3 2 <<"), ["(2 3)", "1"]);
}

// Sequences

#[test]
fn test_unpack() {
    assert_eq!(run("[ 1 2 ] ~"), ["2", "1"]);
    assert_eq!(run("'ab' ~"), ["'b'", "'a'"]);
}

#[test]
fn test_size() {
    assert_eq!(run("[ 1 2 3 ] #"), ["3"]);
    assert_eq!(run("'abcd' #"), ["4"]);
}

#[test]
fn test_indexing() {
    assert_eq!(run("[ 'a' 'b' 'c' ] 1 $"), ["'a'"]);
    assert_eq!(run("( 'a' 'b' 'c' ) 3 $"), ["'c'"]);
    // negative indices count from the end
    assert_eq!(run("'abc' 0 1 - $"), ["'c'"]);
}

#[test]
fn test_concat() {
    assert_eq!(run("[ 1 ] [ 2 ] +"), ["[1 2]"]);
    assert_eq!(run("( 1 ) ( 2 ) +"), ["(1 2)"]);
    // array dominates tuple
    assert_eq!(run("( 1 ) [ 2 ] +"), ["[1 2]"]);
    assert_eq!(run("'ab' 'cd' +"), ["'abcd'"]);
}

#[test]
fn test_append_scalar() {
    assert_eq!(run("'c' [ 'a' 'b' ] +"), ["['a' 'b' 'c']"]);
    assert_eq!(run("[ 'a' 'b' ] 'c' +"), ["['a' 'b' 'c']"]);
    assert_eq!(run("( 1 2 ) 3 +"), ["(1 2 3)"]);
}

#[test]
fn test_repeat() {
    assert_eq!(run("'ab' 3 *"), ["'ababab'"]);
    assert_eq!(run("[ 1 2 ] 2 *"), ["[1 2 1 2]"]);
    assert_eq!(run("2 ( 5 ) *"), ["(5 5)"]);
}

#[test]
fn test_difference() {
    assert_eq!(run("[ 1 2 3 4 5 6 ] [ 2 4 5 ] -"), ["[1 3 6]"]);
    assert_eq!(run("( 1 2 3 2 ) ( 2 ) -"), ["(1 3)"]);
}

#[test]
fn test_set_union() {
    assert_eq!(run("[ 1 3 4 ] [ 7 3 1 2 ] |"), ["[1 3 4 7 2]"]);
}

#[test]
fn test_set_intersection() {
    assert_eq!(run("[ 1 3 4 ] ( 7 3 1 2 ) &"), ["[1 3]"]);
}

#[test]
fn test_set_symmetric_difference() {
    assert_eq!(run("( 1 3 4 ) ( 7 3 1 2 ) ^"), ["(4 7 2)"]);
}

// Blocks and evaluation

#[test]
fn test_eval_block() {
    assert_eq!(run("{ 1 2 + } !"), ["3"]);
    assert_eq!(run("{ 1 2 + } ~"), ["3"]);
}

#[test]
fn test_eval_string() {
    assert_eq!(run("'2 3 +' !"), ["5"]);
}

#[test]
fn test_block_concat() {
    assert_eq!(run("{ 1 } { 2 + } + !"), ["3"]);
}

#[test]
fn test_repeat_block() {
    assert_eq!(run("0 3 { 1 + } *"), ["3"]);
}

#[test]
fn test_invoke() {
    assert_eq!(run("5 { 1 + } %"), ["6"]);
    // the child's whole stack transfers bottom-up
    assert_eq!(run("5 { .. } %"), ["5", "5"]);
}

#[test]
fn test_compose() {
    assert_eq!(run("5 { .. * } |"), ["(25)"]);
}

#[test]
fn test_map() {
    assert_eq!(run("[ 1 2 3 ] { 2 * } /"), ["[2 4 6]"]);
    assert_eq!(run("( 1 2 ) { 1 + } /"), ["(2 3)"]);
}

#[test]
fn test_map_then_unpack() {
    assert_eq!(run("[ 1 2 3 ] { 2 * } / ~"), ["6", "4", "2"]);
}

// Conditionals and loops

#[test]
fn test_not() {
    assert_eq!(run("'a' not"), ["false"]);
    assert_eq!(run("0 not"), ["true"]);
    assert_eq!(run("'' not"), ["true"]);
    assert_eq!(run("[] not"), ["true"]);
}

#[test]
fn test_and_or() {
    assert_eq!(run("true { 1 } and"), ["1"]);
    assert_eq!(run("false { 1 } and"), ["false"]);
    assert_eq!(run("0 5 or"), ["5"]);
    assert_eq!(run("{ 3 } 5 or"), ["3"]);
}

#[test]
fn test_if_pushes_value_branch() {
    assert_eq!(run("true 1 2 if"), ["1"]);
    assert_eq!(run("false 1 2 if"), ["2"]);
}

#[test]
fn test_if_executes_block_branch() {
    assert_eq!(run("10 true { 1 + } { 2 + } if"), ["11"]);
    assert_eq!(run("10 false { 1 + } { 2 + } if"), ["12"]);
}

#[test]
fn test_while() {
    assert_eq!(run("5: n; { n 0 > } { n 1 - : n , } while n"), ["0"]);
}

#[test]
fn test_do_countdown() {
    assert_eq!(run("5 { 1 - .. 0 > } do,"), Vec::<String>::new());
}

// Assignment

#[test]
fn test_assignment_keeps_value() {
    assert_eq!(run("5: x"), ["5"]);
    assert_eq!(run("5: x; x x +"), ["10"]);
}

#[test]
fn test_recursive_factorial() {
    let script = "{ .. 0 = {;1} {.. 1 - factorial% *} if }: factorial; 5 factorial%";
    assert_eq!(run(script), ["120"]);
}

#[test]
fn test_factorial_with_named_argument() {
    let script = "
        {
            :n;  // assign the argument to n
            n 0 <=
            1
            { n 1 - factorial% n * } if
        }: factorial;
        5 factorial%
    ";
    assert_eq!(run(script), ["120"]);
}

#[test]
fn test_destructuring_assignment() {
    assert_eq!(run("( 1 2 ): {a b}; a b +"), ["3"]);
    assert_eq!(run("[ 1 2 3 ]: {a b c}; c b a"), ["1", "2", "3"]);
    assert_eq!(run("'xy': {a b}; b a +"), ["'yx'"]);
}

#[test]
fn test_single_target_block_assignment() {
    assert_eq!(run("[ 1 2 ]: {a}; a #"), ["2"]);
}

#[test]
fn test_index_assignment() {
    assert_eq!(run("[ 2 3 4 5 6 ]: array; 42: {array 2 $}; array"), ["[2 42 4 5 6]"]);
}

#[test]
fn test_index_assignment_through_bound_index() {
    let script = "[ 2 3 4 5 6 ]: array; 2: n; 42: {array n $}; array";
    assert_eq!(run(script), ["[2 42 4 5 6]"]);
}

#[test]
fn test_index_assignment_appends_at_len_plus_one() {
    assert_eq!(run("[ 1 ]: a; 9: {a 2 $}; a"), ["[1 9]"]);
}

#[test]
fn test_array_aliasing() {
    // `-` mutates in place, so the change is visible through both names
    assert_eq!(run("[ 1 2 3 ]: a; a: b; a [ 2 ] - , b"), ["[1 3]"]);
}

#[test]
fn test_array_equality_is_identity() {
    assert_eq!(run("[ 1 ]: a; [ 1 ]: b; a b ="), ["false"]);
    assert_eq!(run("[ 1 ]: a; a a ="), ["true"]);
}

#[test]
fn test_tuple_equality_is_structural() {
    assert_eq!(run("( 1 2 ) ( 1 2 ) ="), ["true"]);
}

// Errors

#[test]
fn test_empty_stack_operand_error() {
    let err = run_err("+");
    assert!(matches!(err.kind(), ErrorKind::Operand { .. }));
    assert!(err.to_string().contains("not enough operands"));
}

#[test]
fn test_invalid_operands() {
    let err = run_err("true false +");
    assert!(matches!(err.kind(), ErrorKind::Operand { .. }));
}

#[test]
fn test_division_by_zero() {
    let err = run_err("1 0 /");
    assert!(err.to_string().contains("division by zero"));
    assert!(run_err("1 0 %").to_string().contains("division by zero"));
    assert!(run_err("1.5 0.0 /").to_string().contains("division by zero"));
}

#[test]
fn test_index_errors() {
    assert!(matches!(run_err("[ 1 2 ] 0 $").kind(), ErrorKind::Index(_)));
    assert!(matches!(run_err("[ 1 2 ] 5 $").kind(), ErrorKind::Index(_)));
    assert!(matches!(run_err("'ab' 3 $").kind(), ErrorKind::Index(_)));
}

#[test]
fn test_name_error() {
    let err = run_err("nope");
    assert!(matches!(err.kind(), ErrorKind::Name(_)));
    assert!(err.to_string().contains("nope"));
}

#[test]
fn test_assignment_count_mismatch() {
    let err = run_err("( 1 2 ): {a b c}");
    assert!(matches!(err.kind(), ErrorKind::Assignment(_)));
    assert!(err.to_string().contains("not enough values to unpack"));

    let err = run_err("( 1 2 3 ): {a b}");
    assert!(err.to_string().contains("too many values to unpack"));
}

#[test]
fn test_assignment_to_non_target() {
    let err = run_err("1: {2 3}");
    assert!(matches!(err.kind(), ErrorKind::Assignment(_)));
}

#[test]
fn test_dangling_assignment() {
    let err = run_err("1 :");
    assert!(matches!(err.kind(), ErrorKind::Syntax(_)));
}

#[test]
fn test_unmatched_delimiter_position() {
    let err = run_err("[ 1 2");
    assert!(matches!(err.kind(), ErrorKind::Syntax(_)));
    let pos = err.pos().expect("syntax errors carry a position");
    assert_eq!(pos.line, 1);
    assert_eq!(pos.column, 1);
    assert_eq!(pos.text, "[");
}

#[test]
fn test_error_position_attached_by_evaluator() {
    let err = run_err("1\n2 nope");
    let pos = err.pos().expect("name errors get the symbol position");
    assert_eq!(pos.line, 2);
    assert_eq!(pos.text, "nope");
}

#[test]
fn test_collect_underflow_is_generic() {
    let err = run_err("1 5 <<");
    assert!(matches!(err.kind(), ErrorKind::Generic(_)));
}

#[test]
fn test_namespace_isolation_of_invoke() {
    // bindings made inside `%` stay in the child frame
    let err = run_err("5 { :inner } % inner");
    assert!(matches!(err.kind(), ErrorKind::Name(_)));
}

#[test]
fn test_while_condition_must_be_single_value() {
    let err = run_err("{ 1 2 } { } while");
    assert!(err.to_string().contains("single value"));
}
