// ==========================================
// 主数据 API 测试
// ==========================================
// 职责: 往来单位 / 部门 / 员工 / 库存品的增删改查与约束映射
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod reference_api_test {
    use factory_ledger::api::ApiError;
    use factory_ledger::app::dispatch_json;
    use factory_ledger::domain::{
        CompanyFields, DepartmentFields, EmployeeFields, HistoryFilter, InventoryItemUpdate,
        NewInventoryItem, SellLine,
    };
    use factory_ledger::ItemKind;
    use serde_json::json;

    use crate::test_helpers::setup_app;

    fn employee(name: &str, role: &str, salary: f64) -> EmployeeFields {
        EmployeeFields {
            employee_name: name.to_string(),
            role: Some(role.to_string()),
            salary,
            ..Default::default()
        }
    }

    #[test]
    fn test_supplier_crud() {
        let (_tmp, _db_path, state) = setup_app();
        let api = &state.reference_api;

        let created = api.add_supplier(&CompanyFields::named("Umbrella")).unwrap();
        assert!(created.s_id > 0);

        let mut fields = CompanyFields::named("Umbrella Corp");
        fields.email = Some("ops@umbrella.test".to_string());
        let updated = api.update_supplier(created.s_id, &fields).unwrap();
        assert_eq!(updated.company_name, "Umbrella Corp");
        assert_eq!(updated.email.as_deref(), Some("ops@umbrella.test"));

        assert_eq!(api.get_supplier(created.s_id).unwrap(), updated);
        assert_eq!(api.list_suppliers().unwrap().len(), 3);

        api.delete_supplier(created.s_id).unwrap();
        assert!(matches!(
            api.get_supplier(created.s_id).unwrap_err(),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            api.delete_supplier(created.s_id).unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_supplier_with_bills_cannot_be_deleted() {
        let (_tmp, _db_path, state) = setup_app();
        state
            .transaction_api
            .sell(1, &[SellLine::new("Resin", 1.0, 1.0)])
            .unwrap();

        let err = state.reference_api.delete_supplier(1).unwrap_err();
        assert!(matches!(err, ApiError::ConstraintViolation(_)), "got {:?}", err);
    }

    #[test]
    fn test_duplicate_department_is_constraint_violation() {
        let (_tmp, _db_path, state) = setup_app();

        let err = state
            .reference_api
            .add_department(&DepartmentFields {
                department_name: "Assembly".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::ConstraintViolation(_)), "got {:?}", err);

        let response = dispatch_json(
            &state,
            &json!({"op": "add_department", "args": {"fields": {"department_name": "Assembly"}}})
                .to_string(),
        );
        assert_eq!(response["success"], json!(false));
        assert!(response["error"].as_str().unwrap().contains("唯一约束"));
    }

    #[test]
    fn test_employee_search_and_raise() {
        let (_tmp, _db_path, state) = setup_app();
        let api = &state.reference_api;

        let ann = api.add_employee(&employee("Ann", "Welder", 1000.0)).unwrap();
        let bob = api.add_employee(&employee("Bob", "Welder", 2000.0)).unwrap();
        let cid = api.add_employee(&employee("Cid", "Clerk", 900.0)).unwrap();

        let welders = api.list_employees(Some("weld")).unwrap();
        assert_eq!(welders.len(), 2);
        assert_eq!(api.list_employees(None).unwrap().len(), 3);

        let affected = api.apply_raise_to_role("Welder", 10.0).unwrap();
        assert_eq!(affected, 2);

        assert!((api.get_employee(ann.e_id).unwrap().salary - 1100.0).abs() < 1e-9);
        assert!((api.get_employee(bob.e_id).unwrap().salary - 2200.0).abs() < 1e-9);
        assert_eq!(api.get_employee(cid.e_id).unwrap().salary, 900.0);
    }

    #[test]
    fn test_raise_rejects_invalid_percentage() {
        let (_tmp, _db_path, state) = setup_app();
        let err = state
            .reference_api
            .apply_raise_to_role("Welder", f64::NAN)
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[test]
    fn test_inventory_item_crud() {
        let (_tmp, _db_path, state) = setup_app();
        let api = &state.reference_api;

        let created = api
            .add_item(
                ItemKind::Material,
                &NewInventoryItem {
                    name: "Glue".to_string(),
                    stock: 3.0,
                    unit: "l".to_string(),
                },
            )
            .unwrap();
        assert_eq!(created.kind, ItemKind::Material);
        assert_eq!(created.stock, 3.0);

        let names: Vec<String> = api
            .list_items(ItemKind::Material)
            .unwrap()
            .into_iter()
            .map(|item| item.name)
            .collect();
        assert_eq!(names, vec!["Glue", "Resin", "Steel"]);

        let err = api
            .add_item(
                ItemKind::Material,
                &NewInventoryItem {
                    name: "Glue".to_string(),
                    stock: 1.0,
                    unit: "l".to_string(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::ConstraintViolation(_)));

        let err = api
            .add_item(
                ItemKind::Product,
                &NewInventoryItem {
                    name: "Lamp".to_string(),
                    stock: -1.0,
                    unit: "pcs".to_string(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));

        api.delete_item(ItemKind::Material, "Glue").unwrap();
        assert!(matches!(
            api.get_item(ItemKind::Material, "Glue").unwrap_err(),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_rename_keeps_history_linked() {
        let (_tmp, _db_path, state) = setup_app();
        state
            .transaction_api
            .sell(1, &[SellLine::new("Resin", 5.0, 2.0)])
            .unwrap();

        let renamed = state
            .reference_api
            .update_item(
                ItemKind::Material,
                "Resin",
                &InventoryItemUpdate {
                    new_name: Some("Epoxy Resin".to_string()),
                    unit: None,
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Epoxy Resin");
        assert_eq!(renamed.stock, 55.0);
        assert_eq!(renamed.unit, "kg");

        let recent = state.report_api.recent_activity(None).unwrap();
        assert_eq!(recent[0].item, "Epoxy Resin");
        let history = state
            .report_api
            .transaction_history(&HistoryFilter::all())
            .unwrap();
        assert_eq!(history.len(), 1);

        // 被明细引用的库存品不能删除
        let err = state
            .reference_api
            .delete_item(ItemKind::Material, "Epoxy Resin")
            .unwrap_err();
        assert!(matches!(err, ApiError::ConstraintViolation(_)), "got {:?}", err);
    }

    #[test]
    fn test_item_commands_through_dispatcher() {
        let (_tmp, _db_path, state) = setup_app();

        let response = dispatch_json(
            &state,
            &json!({"op": "get_item", "args": {"kind": "product", "name": "Chair"}}).to_string(),
        );
        assert_eq!(response["success"], json!(true));
        assert_eq!(response["data"]["stock"], json!(5.0));

        let response = dispatch_json(&state, "not json");
        assert_eq!(response["success"], json!(false));
        assert!(response["error"].as_str().unwrap().contains("请求格式错误"));
    }
}
