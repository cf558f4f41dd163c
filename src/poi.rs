//! Apache POI recipes: the int cell type codes and font weights retired
//! in POI 4.

use std::sync::Arc;

use rewrite_apache_core::recipe::{
    ArgSource, ArgumentConstraint, CompositeRecipe, Recipe, RecipeDescriptor, TemplateRecipe,
};
use rewrite_apache_core::template::JavaTemplate;
use rewrite_apache_core::tree::{Expr, ExprKind, Symbol};

use crate::Error;

const CELL: &str = "org.apache.poi.ss.usermodel.Cell";
const CELL_TYPE: &str = "org.apache.poi.ss.usermodel.CellType";
const FONT: &str = "org.apache.poi.ss.usermodel.Font";

/// `(CellType constant, legacy int code)`.
const CELL_TYPES: [(&str, i64); 6] = [
    ("NUMERIC", 0),
    ("STRING", 1),
    ("FORMULA", 2),
    ("BLANK", 3),
    ("BOOLEAN", 4),
    ("ERROR", 5),
];

/// Whether `expr` reads the static field `owner.name`, through the class,
/// an instance or a static import.
fn is_constant(expr: &Expr, owner: &str, name: &str) -> bool {
    let symbol = match &expr.kind {
        ExprKind::Ident(ident) if &*ident.name == name => &ident.symbol,
        ExprKind::FieldAccess(fa) if &*fa.name == name => &fa.symbol,
        _ => return false,
    };
    matches!(symbol, Symbol::Field { owner: o, .. } if &**o == owner)
}

/// A constraint accepting the literal `code` or the named constant.
fn code_or_constant(code: i64, owner: &'static str, name: String) -> ArgumentConstraint {
    ArgumentConstraint::predicate(move |expr| {
        expr.int_value() == Some(code) || is_constant(expr, owner, &name)
    })
}

fn title_case(constant: &str) -> String {
    let lower = constant.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `cell.setCellType(int)` with a known code to `cell.setCellType(CellType.X)`.
pub fn replace_set_cell_type() -> Result<CompositeRecipe, Error> {
    let mut recipes: Vec<Arc<dyn Recipe>> = Vec::with_capacity(CELL_TYPES.len());
    for (constant, code) in CELL_TYPES {
        let descriptor = RecipeDescriptor::new(
            format!("apache.poi.ReplaceSetCellType.{}", title_case(constant)),
            format!("Replace `Cell.setCellType(Cell.CELL_TYPE_{constant})` with `Cell.setCellType(CellType.{constant})`"),
            format!("Replace `Cell.setCellType(Cell.CELL_TYPE_{constant})` with `Cell.setCellType(CellType.{constant})`."),
        );
        let template = JavaTemplate::builder(&format!("#{{any({CELL})}}.setCellType(CellType.{constant})"))
            .imports(&[CELL_TYPE])
            .build()?;
        let recipe = TemplateRecipe::builder(descriptor, &format!("{CELL} setCellType(int)"), template)
            .constraint(
                ArgSource::Arg(0),
                code_or_constant(code, CELL, format!("CELL_TYPE_{constant}")),
            )
            .args(&[ArgSource::Select])
            .build()?;
        recipes.push(Arc::new(recipe));
    }
    Ok(CompositeRecipe::new(
        RecipeDescriptor::new(
            "apache.poi.ReplaceSetCellType",
            "Replace `Cell.setCellType(int)` with `Cell.setCellType(CellType)`",
            "Replace `Cell.setCellType(int)` with equivalent `Cell.setCellType(CellType)`.",
        )
        .with_tags(&["apache", "poi"]),
        recipes,
    ))
}

/// `font.setBoldweight(700)` to `font.setBold(true)` and the normal weight
/// to `font.setBold(false)`.
pub fn replace_set_boldweight_with_set_bold() -> Result<CompositeRecipe, Error> {
    let weights = [("BOLDWEIGHT_BOLD", 700, true), ("BOLDWEIGHT_NORMAL", 400, false)];
    let mut recipes: Vec<Arc<dyn Recipe>> = Vec::with_capacity(weights.len());
    for (constant, weight, bold) in weights {
        let descriptor = RecipeDescriptor::new(
            format!("apache.poi.ReplaceSetBoldweightWithSetBold.{}", if bold { "Bold" } else { "Normal" }),
            "Replace `Font.setBoldweight(short)` with `Font.setBold(boolean)`",
            "Replace `Font.setBoldweight(short)` with `Font.setBold(boolean)`.",
        );
        let template = JavaTemplate::builder(&format!("#{{any({FONT})}}.setBold({bold})")).build()?;
        let recipe = TemplateRecipe::builder(descriptor, &format!("{FONT} setBoldweight(short)"), template)
            .constraint(ArgSource::Arg(0), code_or_constant(weight, FONT, constant.to_string()))
            .args(&[ArgSource::Select])
            .build()?;
        recipes.push(Arc::new(recipe));
    }
    Ok(CompositeRecipe::new(
        RecipeDescriptor::new(
            "apache.poi.ReplaceSetBoldweightWithSetBold",
            "Replace `Font.setBoldweight(short)` with `Font.setBold(boolean)`",
            "Replace `Font.setBoldweight(short)` with `Font.setBold(boolean)`.",
        )
        .with_tags(&["apache", "poi"]),
        recipes,
    ))
}

/// Both POI migrations.
pub fn upgrade_apache_poi() -> Result<CompositeRecipe, Error> {
    Ok(CompositeRecipe::new(
        RecipeDescriptor::new(
            "apache.poi.UpgradeApachePoi",
            "Migrate to Apache POI 4 API",
            "Replace int cell type codes and font weights removed in Apache POI 4.",
        )
        .with_tags(&["apache", "poi"]),
        vec![
            Arc::new(replace_set_cell_type()?),
            Arc::new(replace_set_boldweight_with_set_bold()?),
        ],
    ))
}
