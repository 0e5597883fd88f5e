//! Shopping list built from the recipes in a user's cart.

use crate::error::ApiError;
use crate::orm::{carts, ingredients, recipe_ingredients, recipes};
use sea_orm::{entity::*, query::*, ConnectionTrait, FromQueryResult};
use std::collections::HashMap;
use std::fmt::Write;

/// File name offered to the client.
pub const FILENAME: &str = "shopping_cart.txt";

/// One ingredient line of one recipe in the cart.
#[derive(Clone, Debug, FromQueryResult)]
pub struct CartLine {
    pub ingredient_id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShoppingItem {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Every ingredient line of every recipe in the cart, in cart insertion
/// order and then recipe ingredient order.
pub async fn cart_lines<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<CartLine>, ApiError> {
    Ok(carts::Entity::find()
        .select_only()
        .column_as(recipe_ingredients::Column::IngredientId, "ingredient_id")
        .column_as(ingredients::Column::Name, "name")
        .column_as(ingredients::Column::MeasurementUnit, "measurement_unit")
        .column_as(recipe_ingredients::Column::Amount, "amount")
        .join(JoinType::InnerJoin, carts::Relation::Recipe.def())
        .join(JoinType::InnerJoin, recipes::Relation::RecipeIngredients.def())
        .join(JoinType::InnerJoin, recipe_ingredients::Relation::Ingredient.def())
        .filter(carts::Column::UserId.eq(user_id))
        .order_by_asc(carts::Column::Id)
        .order_by_asc(recipe_ingredients::Column::Id)
        .into_model::<CartLine>()
        .all(db)
        .await?)
}

/// Sums amounts per ingredient, keeping the order ingredients first appear in.
pub fn aggregate(lines: &[CartLine]) -> Vec<ShoppingItem> {
    let mut items: Vec<ShoppingItem> = Vec::new();
    let mut index: HashMap<i32, usize> = HashMap::new();

    for line in lines {
        match index.get(&line.ingredient_id) {
            Some(&i) => items[i].total += i64::from(line.amount),
            None => {
                index.insert(line.ingredient_id, items.len());
                items.push(ShoppingItem {
                    name: line.name.to_owned(),
                    measurement_unit: line.measurement_unit.to_owned(),
                    total: i64::from(line.amount),
                });
            }
        }
    }
    items
}

/// `name (unit) — total`, one item per line.
pub fn render(items: &[ShoppingItem]) -> String {
    let mut out = String::new();
    for item in items {
        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "{} ({}) — {}",
            item.name, item.measurement_unit, item.total
        );
    }
    out
}

/// The downloadable shopping list for a user.
pub async fn shopping_list<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<String, ApiError> {
    let lines = cart_lines(db, user_id).await?;
    let items = aggregate(&lines);
    log::debug!(
        "Shopping list for user_id={}: {} line(s), {} item(s)",
        user_id,
        lines.len(),
        items.len()
    );
    Ok(render(&items))
}
