// ==========================================
// 并发库存测试
// ==========================================
// 职责: 验证并发写入下库存等于全部增量之和（与提交顺序无关）
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod concurrent_stock_test {
    use factory_ledger::domain::{HistoryFilter, ProductionLine, SellLine};
    use factory_ledger::ActivityType;
    use std::sync::Arc;
    use std::thread;

    use crate::test_helpers::{setup_app, snapshot};

    #[test]
    fn test_concurrent_sells_sum_all_deltas() {
        let (_tmp, db_path, state) = setup_app();
        let state = Arc::new(state);

        let workers = 6;
        let rounds = 5;
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                let state = Arc::clone(&state);
                thread::spawn(move || {
                    for _ in 0..rounds {
                        state
                            .transaction_api
                            .sell(1, &[SellLine::new("Resin", 10.0, 1.0)])
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let after = snapshot(&db_path);
        assert_eq!(after.materials["Resin"], 50.0 + (workers * rounds) as f64 * 10.0);
        assert_eq!(after.row_counts["sells"], (workers * rounds) as i64);

        let purchases = state
            .report_api
            .transaction_history(&HistoryFilter::only(ActivityType::Purchase))
            .unwrap();
        assert_eq!(purchases.len(), workers * rounds);
    }

    #[test]
    fn test_concurrent_sell_and_production_on_same_material() {
        let (_tmp, db_path, state) = setup_app();
        let state = Arc::new(state);

        // Resin: +4 × 5 (采购) 与 -2 × 5 (生产投入) 交错执行
        let seller = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for _ in 0..5 {
                    state
                        .transaction_api
                        .sell(1, &[SellLine::new("Resin", 4.0, 1.0)])
                        .unwrap();
                }
            })
        };
        let producer = {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                for _ in 0..5 {
                    state
                        .transaction_api
                        .produce(
                            1,
                            &[ProductionLine::new("Resin", 2.0, "kg")],
                            &[ProductionLine::new("Chair", 1.0, "pcs")],
                        )
                        .unwrap();
                }
            })
        };
        seller.join().unwrap();
        producer.join().unwrap();

        let after = snapshot(&db_path);
        assert_eq!(after.materials["Resin"], 50.0 + 20.0 - 10.0);
        assert_eq!(after.products["Chair"], 10.0);
        assert_eq!(after.row_counts["production_input"], 5);
    }
}
