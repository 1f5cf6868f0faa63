// ==========================================
// 交易端到端测试
// ==========================================
// 职责: 验证采购 / 销售 / 生产三类操作的原子性与库存变动
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod transaction_e2e_test {
    use factory_ledger::api::ApiError;
    use factory_ledger::app::dispatch_json;
    use factory_ledger::domain::{BuyLine, HistoryFilter, ProductionLine, SellLine};
    use factory_ledger::ActivityType;
    use serde_json::json;

    use crate::test_helpers::{material_stock, product_stock, setup_app, snapshot};

    // ==========================================
    // Sell
    // ==========================================

    #[test]
    fn test_sell_increases_material_stock() {
        let (_tmp, db_path, state) = setup_app();

        let receipt = state
            .transaction_api
            .sell(1, &[SellLine::new("Resin", 100.0, 2.5)])
            .unwrap();
        assert!(receipt.bill_id > 0);
        assert_eq!(material_stock(&db_path, "Resin"), 150.0);

        let history = state
            .report_api
            .transaction_history(&HistoryFilter::only(ActivityType::Purchase))
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, receipt.bill_id);
        assert_eq!(history[0].party, "Acme");
        assert_eq!(history[0].total_value, Some(250.0));
    }

    #[test]
    fn test_sell_multiple_lines_share_one_bill() {
        let (_tmp, db_path, state) = setup_app();

        let receipt = state
            .transaction_api
            .sell(
                2,
                &[
                    SellLine::new("Resin", 10.0, 2.0),
                    SellLine::new("Steel", 4.0, 8.0),
                ],
            )
            .unwrap();

        let after = snapshot(&db_path);
        assert_eq!(after.row_counts["sells"], 1);
        assert_eq!(after.row_counts["sells_item"], 2);
        assert_eq!(after.materials["Resin"], 60.0);
        assert_eq!(after.materials["Steel"], 24.0);

        let history = state
            .report_api
            .transaction_history(&HistoryFilter::only(ActivityType::Purchase))
            .unwrap();
        assert_eq!(history[0].id, receipt.bill_id);
        assert_eq!(history[0].total_value, Some(52.0));
    }

    #[test]
    fn test_sell_unknown_material_rolls_back_whole_bill() {
        let (_tmp, db_path, state) = setup_app();
        let before = snapshot(&db_path);

        let err = state
            .transaction_api
            .sell(
                1,
                &[
                    SellLine::new("Resin", 10.0, 2.0),
                    SellLine::new("Unobtainium", 1.0, 99.0),
                ],
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)), "got {:?}", err);

        // 头与第一行都不可见，Resin 库存不变
        assert_eq!(snapshot(&db_path), before);
    }

    #[test]
    fn test_sell_unknown_supplier_is_not_found() {
        let (_tmp, db_path, state) = setup_app();
        let before = snapshot(&db_path);

        let err = state
            .transaction_api
            .sell(99, &[SellLine::new("Resin", 10.0, 2.0)])
            .unwrap_err();
        match err {
            ApiError::NotFound(msg) => assert!(msg.contains("Supplier")),
            other => panic!("Expected NotFound, got {:?}", other),
        }
        assert_eq!(snapshot(&db_path), before);
    }

    // ==========================================
    // Buy
    // ==========================================

    #[test]
    fn test_buy_threads_bill_id_across_items() {
        let (_tmp, db_path, state) = setup_app();

        let receipt = state
            .transaction_api
            .buy(
                1,
                &[
                    BuyLine::new("Chair", 2.0, 30.0),
                    BuyLine::new("Table", 1.0, 90.0),
                ],
            )
            .unwrap();

        let after = snapshot(&db_path);
        assert_eq!(after.row_counts["buys"], 1);
        assert_eq!(after.row_counts["buys_item"], 2);
        assert_eq!(after.products["Chair"], 3.0);
        assert_eq!(after.products["Table"], 1.0);

        let history = state
            .report_api
            .transaction_history(&HistoryFilter::only(ActivityType::Sale))
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, receipt.bill_id);
        assert_eq!(history[0].party, "Globex");
        assert_eq!(history[0].total_value, Some(150.0));
    }

    #[test]
    fn test_buy_insufficient_stock_rolls_back_and_keeps_reason() {
        let (_tmp, db_path, state) = setup_app();
        let before = snapshot(&db_path);

        // 第一行成功后第二行库存不足
        let err = state
            .transaction_api
            .buy(
                1,
                &[
                    BuyLine::new("Chair", 2.0, 30.0),
                    BuyLine::new("Table", 5.0, 90.0),
                ],
            )
            .unwrap_err();

        match &err {
            ApiError::BusinessRuleViolation(msg) => {
                assert!(msg.contains("库存不足"));
                assert!(msg.contains("Table"));
                // 原因原样透传，不加前缀
                assert_eq!(err.to_string(), *msg);
            }
            other => panic!("Expected BusinessRuleViolation, got {:?}", other),
        }

        // 单据头、第一行明细、Chair 扣减全部回滚
        assert_eq!(snapshot(&db_path), before);
        assert_eq!(product_stock(&db_path, "Chair"), 5.0);
    }

    #[test]
    fn test_buy_reason_reaches_envelope_verbatim() {
        let (_tmp, _db_path, state) = setup_app();

        let response = dispatch_json(
            &state,
            &json!({
                "op": "buy",
                "args": {"buyer_id": 1, "items": [{"product_name": "Table", "quantity": 3.0, "cost": 90.0}]}
            })
            .to_string(),
        );

        assert_eq!(response["success"], json!(false));
        assert!(response.get("data").is_none());
        let reason = response["error"].as_str().unwrap();
        assert!(reason.starts_with("库存不足"));
        assert!(reason.contains("Table"));
    }

    // ==========================================
    // Production
    // ==========================================

    #[test]
    fn test_produce_consumes_materials_and_creates_products() {
        let (_tmp, db_path, state) = setup_app();

        state
            .transaction_api
            .produce(
                1,
                &[
                    ProductionLine::new("Resin", 10.0, "kg"),
                    ProductionLine::new("Steel", 5.0, "kg"),
                ],
                &[ProductionLine::new("Chair", 3.0, "pcs")],
            )
            .unwrap();

        let after = snapshot(&db_path);
        assert_eq!(after.materials["Resin"], 40.0);
        assert_eq!(after.materials["Steel"], 15.0);
        assert_eq!(after.products["Chair"], 8.0);
        assert_eq!(after.row_counts["production_input"], 2);
        assert_eq!(after.row_counts["production_output"], 1);
    }

    #[test]
    fn test_produce_insufficient_material_rolls_back() {
        let (_tmp, db_path, state) = setup_app();
        let before = snapshot(&db_path);

        let err = state
            .transaction_api
            .produce(
                1,
                &[
                    ProductionLine::new("Resin", 10.0, "kg"),
                    ProductionLine::new("Steel", 25.0, "kg"),
                ],
                &[ProductionLine::new("Chair", 3.0, "pcs")],
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::BusinessRuleViolation(_)), "got {:?}", err);
        assert_eq!(snapshot(&db_path), before);
    }

    #[test]
    fn test_produce_unknown_output_rolls_back_inputs() {
        let (_tmp, db_path, state) = setup_app();
        let before = snapshot(&db_path);

        let err = state
            .transaction_api
            .produce(
                1,
                &[ProductionLine::new("Resin", 10.0, "kg")],
                &[ProductionLine::new("Sofa", 1.0, "pcs")],
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)), "got {:?}", err);
        assert_eq!(snapshot(&db_path), before);
    }

    #[test]
    fn test_empty_lists_are_validation_errors() {
        let (_tmp, db_path, state) = setup_app();
        let before = snapshot(&db_path);

        let err = state.transaction_api.sell(1, &[]).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));

        let err = state.transaction_api.buy(1, &[]).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));

        let response = dispatch_json(
            &state,
            &json!({
                "op": "produce",
                "args": {
                    "department_id": 1,
                    "inputs": [{"name": "Resin", "quantity": 1.0, "unit": "kg"}],
                    "outputs": []
                }
            })
            .to_string(),
        );
        assert_eq!(response["success"], json!(false));
        assert!(response["error"].as_str().unwrap().contains("生产产出"));

        assert_eq!(snapshot(&db_path), before);
    }

    #[test]
    fn test_failed_operation_returns_connection_to_pool() {
        let (_tmp, _db_path, state) = setup_app();

        let _ = state
            .transaction_api
            .buy(1, &[BuyLine::new("Table", 10.0, 1.0)])
            .unwrap_err();

        let status = state.connections.pool_status().unwrap();
        assert_eq!(status.checked_out, 0);
        assert!(status.idle >= 1);
    }
}
