//! Shop and menu records.

use serde::{Deserialize, Serialize};

use crate::types::{MenuItemId, Price, ShopId, UserId};

/// A seller's storefront.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    #[serde(rename = "_id", alias = "id")]
    pub id: ShopId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "logo", alias = "banner", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, alias = "location")]
    pub address: String,
    #[serde(default, alias = "ownerId", alias = "seller", skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
}

/// Fields sent when creating or updating a shop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopDraft {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
}

/// One purchasable entry on a shop's menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[serde(rename = "_id", alias = "id")]
    pub id: MenuItemId,
    #[serde(default, alias = "shopId", skip_serializing_if = "Option::is_none")]
    pub shop: Option<ShopId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "available_by_default", alias = "isAvailable")]
    pub available: bool,
}

const fn available_by_default() -> bool {
    true
}

/// Fields sent when creating or updating a menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemDraft {
    pub name: String,
    pub description: String,
    pub price: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub available: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_item_defaults_to_available() {
        let item: MenuItem =
            serde_json::from_str(r#"{"_id":"m1","shopId":"s1","name":"Dosa","price":3.5}"#).unwrap();
        assert!(item.available);
        assert_eq!(item.shop.unwrap().as_str(), "s1");
    }

    #[test]
    fn test_shop_aliases() {
        let shop: Shop =
            serde_json::from_str(r#"{"id":"s1","name":"Spice Hub","logo":"l.png","seller":"u9"}"#)
                .unwrap();
        assert_eq!(shop.image.as_deref(), Some("l.png"));
        assert_eq!(shop.owner.unwrap().as_str(), "u9");
    }
}
