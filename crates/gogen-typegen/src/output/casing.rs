//! Identifier case conversion.

/// Split an identifier into words.
///
/// `_`, `-` and spaces separate words. An upper-case letter starts a new
/// word when it follows a lower-case letter (`userID` → `user`, `ID`) or
/// precedes one (`HTTPServer` → `HTTP`, `Server`).
pub fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '_' | '-' | ' ') {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && i > 0 {
            let after_lower = chars[i - 1].is_lowercase();
            let before_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if (after_lower || before_lower) && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// `user_id` → `UserId`.
pub fn pascal_case(s: &str) -> String {
    split_words(s).iter().map(|w| capitalize(w)).collect()
}

/// `user_id` → `userId`.
pub fn camel_case(s: &str) -> String {
    let pascal = pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => pascal,
    }
}

/// `UserID` → `user_id`.
pub fn snake_case(s: &str) -> String {
    join_lower(s, "_")
}

/// `UserID` → `user-id`.
pub fn kebab_case(s: &str) -> String {
    join_lower(s, "-")
}

fn join_lower(s: &str, separator: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(separator)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_case_and_separators() {
        assert_eq!(split_words("userID"), vec!["user", "ID"]);
        assert_eq!(split_words("HTTPServer"), vec!["HTTP", "Server"]);
        assert_eq!(split_words("created_at-date now"), vec!["created", "at", "date", "now"]);
        assert_eq!(split_words("__x__"), vec!["x"]);
        assert!(split_words("").is_empty());
    }

    #[test]
    fn conversions() {
        assert_eq!(camel_case("CreatedAt"), "createdAt");
        assert_eq!(camel_case("user_id"), "userId");
        assert_eq!(pascal_case("order-item"), "OrderItem");
        assert_eq!(pascal_case("ID"), "Id");
        assert_eq!(snake_case("OrderItemID"), "order_item_id");
        assert_eq!(kebab_case("ProductCategory"), "product-category");
        assert_eq!(camel_case(""), "");
    }
}
