//! Fine-grained operator names for Stryker mutants.
//!
//! Stryker groups mutants by mutator (`ArithmeticOperator`, `EqualityOperator`,
//! ...). Scoring works better on the individual rewrite, so the name is refined
//! from the differing part of the original and replacement text, e.g.
//! `ArithmeticOperator+To-`.

use crate::stryker::Location;
use regex::Regex;
use std::sync::LazyLock;

const ARITHMETIC_OPERATORS: &[&str] = &["+", "-", "*", "/", "%"];
const COMPARATOR_OPERATORS: &[&str] = &["<", "<=", ">", ">=", "=", "!"];
const LOGICAL_OPERATORS: &[&str] = &["&&", "||", "??"];
const UNARY_OPERATORS: &[&str] = &["+", "-"];

/// Mutators that only ever produce one kind of rewrite, or whose rewrites are
/// not worth telling apart.
const SINGLE_SHAPE_MUTATORS: &[&str] = &[
    "ArrowFunction",
    "BlockStatement",
    "ObjectLiteral",
    "OptionalChaining",
    "Regex",
];

static NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[()\s]").expect("noise pattern is a valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
struct StringDifference {
    original: String,
    replacement: String,
}

/// Names the rewrite `original -> replacement` produced by `mutator`.
pub fn deduce_operator_name(mutator: &str, original: &str, replacement: &str) -> String {
    let name = match mutator {
        "ArithmeticOperator" => arithmetic(original, replacement),
        "ArrayDeclaration" => array_declaration(replacement),
        "AssignmentExpression" => assignment(original, replacement),
        "BooleanLiteral" => boolean_literal(original, replacement),
        "ConditionalExpression" => conditional(original, replacement),
        "EqualityOperator" => equality(original, replacement),
        "LogicalOperator" => logical(original, replacement),
        "StringLiteral" => string_literal(replacement),
        "UnaryOperator" => unary(original, replacement),
        "UpdateOperator" => update(original),
        m if SINGLE_SHAPE_MUTATORS.contains(&m) => Some(m.to_string()),
        other => {
            tracing::warn!(
                mutator = other,
                "unknown mutator {}: {} -> {}",
                other,
                original,
                replacement
            );
            Some(other.to_string())
        }
    };

    name.unwrap_or_else(|| {
        tracing::warn!("{} - unknown mutation: {} -> {}", mutator, original, replacement);
        format!("{}Unknown", mutator)
    })
}

/// Source text covered by `location` (1-based lines and columns, end exclusive).
/// Returns `None` when the location does not fit the source.
pub fn find_code(source: &str, location: &Location) -> Option<String> {
    let lines: Vec<&str> = source.lines().collect();
    let start_line = location.start.line.checked_sub(1)?;
    let start_col = location.start.column.checked_sub(1)?;
    let end_line = location.end.line.checked_sub(1)?;
    let end_col = location.end.column.checked_sub(1)?;
    if end_line < start_line || end_line >= lines.len() {
        return None;
    }

    let slice = |line: &str, from: usize, to: Option<usize>| -> Option<String> {
        let chars: Vec<char> = line.chars().collect();
        let to = to.unwrap_or(chars.len());
        (from <= to && to <= chars.len()).then(|| chars[from..to].iter().collect())
    };

    if start_line == end_line {
        return slice(lines[start_line], start_col, Some(end_col));
    }

    let mut code = slice(lines[start_line], start_col, None)?;
    for line in &lines[start_line + 1..end_line] {
        code.push_str(line);
    }
    code.push_str(&slice(lines[end_line], 0, Some(end_col))?);
    Some(code)
}

fn normalize(text: &str) -> Vec<char> {
    NOISE.replace_all(text, "").chars().collect()
}

/// Middle section where `original` and `replacement` differ, ignoring
/// parentheses and whitespace. When one side would be empty the section is
/// widened by one character to the left, so `<` vs `<=` stays readable.
fn string_difference(original: &str, replacement: &str) -> StringDifference {
    let original = normalize(original);
    let replacement = normalize(replacement);
    let shortest = original.len().min(replacement.len());

    let common_prefix = original
        .iter()
        .zip(&replacement)
        .take_while(|(a, b)| a == b)
        .count();
    let mut front = common_prefix.min(shortest.saturating_sub(1));

    let common_suffix = original
        .iter()
        .rev()
        .zip(replacement.iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    let back = common_suffix.min(shortest - front);

    if front > 0 && (original.len() - back == front || replacement.len() - back == front) {
        front -= 1;
    }

    StringDifference {
        original: original[front..original.len() - back].iter().collect(),
        replacement: replacement[front..replacement.len() - back].iter().collect(),
    }
}

fn known(set: &[&str], difference: &StringDifference) -> bool {
    set.contains(&difference.original.as_str()) && set.contains(&difference.replacement.as_str())
}

fn arithmetic(original: &str, replacement: &str) -> Option<String> {
    let difference = string_difference(original, replacement);
    known(ARITHMETIC_OPERATORS, &difference).then(|| {
        format!(
            "ArithmeticOperator{}To{}",
            difference.original, difference.replacement
        )
    })
}

fn array_declaration(replacement: &str) -> Option<String> {
    let name = match replacement {
        "[]" | "Array()" => "ArrayDeclarationEmpty",
        "new Array()" | "new Array([])" => "ArrayDeclarationEmptyConstructor",
        "[\"Stryker was here\"]" => "ArrayDeclarationFill",
        _ => return None,
    };
    Some(name.to_string())
}

fn assignment(original: &str, replacement: &str) -> Option<String> {
    let difference = string_difference(original, replacement);
    let known_pairs = [
        ("+", "-"),
        ("-", "+"),
        ("*", "/"),
        ("/", "*"),
        ("%", "*"),
        ("<<", ">>"),
        (">>", "<<"),
        ("&", "|"),
        ("|", "&"),
    ];
    known_pairs
        .iter()
        .any(|&(from, to)| difference.original == from && difference.replacement == to)
        .then(|| {
            format!(
                "AssignmentExpression{}=To{}=",
                difference.original, difference.replacement
            )
        })
}

fn boolean_literal(original: &str, replacement: &str) -> Option<String> {
    let name = match replacement {
        "true" => "BooleanLiteralfalseTotrue",
        "false" => "BooleanLiteraltrueTofalse",
        _ if original.contains('!') => "BooleanLiteralRemoveNegation",
        _ => return None,
    };
    Some(name.to_string())
}

fn conditional(original: &str, replacement: &str) -> Option<String> {
    if replacement.starts_with("case") || replacement.starts_with("default") {
        return Some("ConditionalExpressionEmptyCase".to_string());
    }
    if replacement != "true" && replacement != "false" {
        let difference = string_difference(original, replacement);
        return if difference.replacement.contains("true") {
            Some("ConditionalExpressionConditionTotrue".to_string())
        } else if difference.replacement.contains("false") {
            Some("ConditionalExpressionConditionTofalse".to_string())
        } else {
            None
        };
    }

    // longer comparators first so `<=` is not reported as `<`
    let comparator = ["<=", ">=", "===", "!==", "==", "!=", ">", "<"]
        .into_iter()
        .find(|op| original.contains(op))
        .unwrap_or("Condition");
    Some(format!("ConditionalExpression{}To{}", comparator, replacement))
}

fn equality(original: &str, replacement: &str) -> Option<String> {
    let difference = string_difference(original, replacement);
    if !known(COMPARATOR_OPERATORS, &difference) {
        return None;
    }
    let strict = |op: &str| normalize(original).iter().collect::<String>().contains(op);
    let name = match difference.original.as_str() {
        "!" if strict("!==") => "EqualityOperator!==To===".to_string(),
        "!" => "EqualityOperator!=To==".to_string(),
        "=" if strict("===") => "EqualityOperator===To!==".to_string(),
        "=" => "EqualityOperator==To!=".to_string(),
        _ => format!(
            "EqualityOperator{}To{}",
            difference.original, difference.replacement
        ),
    };
    Some(name)
}

fn logical(original: &str, replacement: &str) -> Option<String> {
    let difference = string_difference(original, replacement);
    known(LOGICAL_OPERATORS, &difference).then(|| {
        format!(
            "LogicalOperator{}To{}",
            difference.original, difference.replacement
        )
    })
}

fn string_literal(replacement: &str) -> Option<String> {
    let name = match replacement {
        "\"\"" | "``" | "''" => "StringLiteralEmpty",
        "\"Stryker was here!\"" | "`Stryker was here!`" | "'Stryker was here!'" => {
            "StringLiteralFill"
        }
        "s\"\"" => "StringLiteralInterpolationEmpty",
        _ => return None,
    };
    Some(name.to_string())
}

fn unary(original: &str, replacement: &str) -> Option<String> {
    let difference = string_difference(original, replacement);
    if difference.original == "~" && difference.replacement.is_empty() {
        return Some("UnaryOperatorRemove~".to_string());
    }
    known(UNARY_OPERATORS, &difference).then(|| {
        format!(
            "UnaryOperator{}To{}",
            difference.original, difference.replacement
        )
    })
}

fn update(original: &str) -> Option<String> {
    let name = if original.starts_with("++") {
        "UpdateOperatorPre++To--"
    } else if original.starts_with("--") {
        "UpdateOperatorPre--To++"
    } else if original.ends_with("--") {
        "UpdateOperatorPost--To++"
    } else if original.ends_with("++") {
        "UpdateOperatorPost++To--"
    } else {
        return None;
    };
    Some(name.to_string())
}
