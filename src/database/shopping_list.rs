use std::{collections::HashMap, fmt};

use super::schema::{CartPart, Uuid};

#[derive(Debug, Clone, PartialEq)]
pub struct ShoppingItem {
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Ingredient totals over a user's shopping cart.
///
/// Items keep the order in which their ingredient was first seen, and every
/// cart row counts, so a recipe present twice contributes twice.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ShoppingList {
    items: Vec<ShoppingItem>,
}

impl ShoppingList {
    pub fn from_parts(parts: impl IntoIterator<Item = CartPart>) -> Self {
        let mut items: Vec<ShoppingItem> = vec![];
        let mut index: HashMap<Uuid, usize> = HashMap::new();

        for part in parts {
            match index.get(&part.ingredient_id) {
                Some(&i) => items[i].amount += i64::from(part.amount),
                None => {
                    index.insert(part.ingredient_id, items.len());
                    items.push(ShoppingItem {
                        ingredient_id: part.ingredient_id,
                        name: part.name,
                        measurement_unit: part.measurement_unit,
                        amount: part.amount.into(),
                    });
                }
            }
        }

        Self { items }
    }

    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, item) in self.items.iter().enumerate() {
            writeln!(
                f,
                "{}) {} - {} {}",
                n + 1,
                item.name,
                item.amount,
                item.measurement_unit
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(ingredient_id: Uuid, name: &str, unit: &str, amount: i32) -> CartPart {
        CartPart {
            ingredient_id,
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn sums_one_ingredient_across_recipes() {
        let list = ShoppingList::from_parts(vec![
            part(7, "sugar", "g", 100),
            part(7, "sugar", "g", 50),
        ]);

        assert_eq!(list.to_string(), "1) sugar - 150 g\n");
    }

    #[test]
    fn keeps_first_seen_order_and_numbers_lines() {
        let list = ShoppingList::from_parts(vec![
            part(3, "milk", "ml", 200),
            part(1, "flour", "g", 300),
            part(9, "apricot jam", "g", 40),
            part(3, "milk", "ml", 50),
        ]);

        assert_eq!(
            list.to_string(),
            "1) milk - 250 ml\n2) flour - 300 g\n3) apricot jam - 40 g\n"
        );
    }

    #[test]
    fn duplicate_cart_rows_count_twice() {
        let list = ShoppingList::from_parts(vec![
            part(4, "egg", "pcs", 2),
            part(4, "egg", "pcs", 2),
        ]);

        assert_eq!(list.items()[0].amount, 4);
    }

    #[test]
    fn same_name_different_ingredient_stays_separate() {
        let list = ShoppingList::from_parts(vec![
            part(1, "salt", "g", 5),
            part(2, "salt", "to taste", 1),
        ]);

        assert_eq!(list.items().len(), 2);
    }

    #[test]
    fn empty_cart_renders_nothing() {
        let list = ShoppingList::from_parts(vec![]);
        assert!(list.is_empty());
        assert_eq!(list.to_string(), "");
    }
}
