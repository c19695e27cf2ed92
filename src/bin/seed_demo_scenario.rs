// ==========================================
// 食品制造执行系统 - 演示场景种子程序
// ==========================================
// 造一个完整的执行链路: 入库 → 预留 → 开工 → 消耗
// → 暂停 → 恢复 → 完工, 跑通后打印各处账目
// 用法: FOOD_MES_DB=/tmp/demo.db cargo run --bin seed_demo_scenario
// ==========================================

use anyhow::{Context, Result};
use chrono::Utc;
use food_mes::domain::license_plate::LicensePlate;
use food_mes::domain::work_order::{WorkOrder, WorkOrderMaterial};
use food_mes::repository::license_plate_repo::LicensePlateRepository;
use food_mes::repository::material_repo::WoMaterialRepository;
use food_mes::repository::work_order_repo::WorkOrderRepository;
use food_mes::{
    AuthContext, LpStatus, PauseReason, ProductionApi, Role, WoStatus,
};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const ORG_ID: &str = "org-demo";
const ACTOR: &str = "demo-supervisor";

fn main() -> Result<()> {
    food_mes::logging::init();

    let db_path =
        std::env::var("FOOD_MES_DB").unwrap_or_else(|_| food_mes::db::default_db_path());
    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent).context("创建数据目录失败")?;
    }
    tracing::info!(%db_path, "打开演示数据库");

    let conn = food_mes::db::open_sqlite_connection(&db_path)?;
    food_mes::db::init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let (wo_id, material_id, lp_whole, lp_partial) = seed(&conn)?;

    let api = ProductionApi::new(conn);
    let ctx = AuthContext::new(ACTOR, ORG_ID, Role::Supervisor);

    // 预留: 整托 90kg + 散托 50kg
    let r1 = api
        .reserve_material(&ctx, &material_id, &lp_whole, 90.0)?;
    let r2 = api
        .reserve_material(&ctx, &material_id, &lp_partial, 50.0)?;

    // 开工
    api.start_work_order(&ctx, &wo_id)?;

    // 消耗整托
    let outcome = api
        .start_consumption(&ctx, &wo_id, &r1.reservation_id, 90.0)?;
    tracing::info!(
        variance_pct = outcome.variance_pct,
        lp_depleted = outcome.lp_depleted,
        "整托消耗完成"
    );

    // 暂停 → 恢复
    api.pause_work_order(&ctx, &wo_id, PauseReason::MachineBreakdown, Some("搅拌机跳闸"))?;
    api.resume_work_order(&ctx, &wo_id)?;

    // 部分消耗散托
    let outcome = api
        .start_consumption(&ctx, &wo_id, &r2.reservation_id, 30.0)?;
    tracing::info!(
        lp_qty_after = outcome.lp_qty_after,
        "部分消耗完成"
    );

    // 完工
    api.complete_work_order(&ctx, &wo_id)?;

    // 打印账目
    let history = api
        .get_status_history(&ctx, &wo_id)?;
    for h in &history {
        tracing::info!(
            from = ?h.from_status,
            to = %h.to_status,
            by = %h.changed_by,
            "状态迁移"
        );
    }

    let downtime = api
        .get_downtime_summary(&ctx, &wo_id)?;
    tracing::info!(total_minutes = downtime.total_minutes, "停机汇总");

    tracing::info!(%wo_id, "演示场景执行完成");
    Ok(())
}

/// 造基础数据: 一张 released 工单 + 一条物料行 + 两个容器
fn seed(conn: &Arc<Mutex<Connection>>) -> Result<(String, String, String, String)> {
    let now = Utc::now().naive_utc();
    let wo_id = Uuid::new_v4().to_string();
    let material_id = Uuid::new_v4().to_string();

    let wo_repo = WorkOrderRepository::new(conn.clone());
    wo_repo.insert(&WorkOrder {
        wo_id: wo_id.clone(),
        org_id: ORG_ID.to_string(),
        wo_number: format!("WO-{}-0001", now.format("%Y%m%d")),
        product_id: "prod-bread".to_string(),
        status: WoStatus::Released,
        pause_reason: None,
        paused_at: None,
        paused_by: None,
        started_at: None,
        completed_at: None,
        created_by: ACTOR.to_string(),
        created_at: now,
        updated_at: now,
    })?;

    let material_repo = WoMaterialRepository::new(conn.clone());
    material_repo.insert(&WorkOrderMaterial {
        material_id: material_id.clone(),
        org_id: ORG_ID.to_string(),
        wo_id: wo_id.clone(),
        product_id: "prod-flour".to_string(),
        material_name: "高筋面粉".to_string(),
        required_qty: 120.0,
        consumed_qty: 0.0,
        reserved_qty: 0.0,
        uom: "kg".to_string(),
        consume_whole_lp: false,
    })?;

    let lp_repo = LicensePlateRepository::new(conn.clone());
    let mut lp_ids = Vec::new();
    for (number, qty) in [("LP-DEMO-0001", 90.0), ("LP-DEMO-0002", 50.0)] {
        let lp_id = Uuid::new_v4().to_string();
        lp_repo.insert_with_receipt(
            &LicensePlate {
                lp_id: lp_id.clone(),
                org_id: ORG_ID.to_string(),
                lp_number: number.to_string(),
                product_id: "prod-flour".to_string(),
                quantity: qty,
                uom: "kg".to_string(),
                status: LpStatus::Available,
                qa_status: "passed".to_string(),
                parent_lp_id: None,
                consumed_by_wo_id: None,
                consumed_at: None,
                created_at: now,
            },
            ACTOR,
        )?;
        lp_ids.push(lp_id);
    }

    Ok((wo_id, material_id, lp_ids.remove(0), lp_ids.remove(0)))
}
