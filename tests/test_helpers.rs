// ==========================================
// 集成测试共用夹具
// ==========================================
// 内存库 + 统一造数入口, 各测试文件 `mod test_helpers;` 引入
// ==========================================
#![allow(dead_code)]

use chrono::Utc;
use food_mes::domain::license_plate::LicensePlate;
use food_mes::domain::operation::WoOperation;
use food_mes::domain::work_order::{WorkOrder, WorkOrderMaterial};
use food_mes::repository::license_plate_repo::LicensePlateRepository;
use food_mes::repository::material_repo::WoMaterialRepository;
use food_mes::repository::operation_repo::WoOperationRepository;
use food_mes::repository::work_order_repo::WorkOrderRepository;
use food_mes::{AuthContext, LpStatus, OperationStatus, ProductionApi, Role, WoStatus};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const ORG: &str = "org-test";
pub const OTHER_ORG: &str = "org-other";
pub const PRODUCT: &str = "prod-flour";
pub const ACTOR: &str = "tester";

/// 内存库夹具
pub struct Fixture {
    pub conn: Arc<Mutex<Connection>>,
    pub api: ProductionApi,
    pub ctx: AuthContext,
}

impl Fixture {
    pub fn new() -> Self {
        food_mes::logging::init_test();
        let conn = Connection::open_in_memory().expect("打开内存库");
        food_mes::db::configure_sqlite_connection(&conn).expect("配置连接");
        food_mes::db::init_schema(&conn).expect("初始化 schema");
        let conn = Arc::new(Mutex::new(conn));
        Self {
            api: ProductionApi::new(conn.clone()),
            ctx: AuthContext::new(ACTOR, ORG, Role::Supervisor),
            conn,
        }
    }

    /// 指定角色的上下文
    pub fn ctx_with_role(&self, role: Role) -> AuthContext {
        AuthContext::new(ACTOR, ORG, role)
    }

    /// 跨组织上下文
    pub fn other_org_ctx(&self) -> AuthContext {
        AuthContext::new(ACTOR, OTHER_ORG, Role::Supervisor)
    }

    /// 造工单 (指定初始状态)
    pub fn seed_work_order(&self, status: WoStatus) -> String {
        self.seed_work_order_in_org(ORG, status)
    }

    pub fn seed_work_order_in_org(&self, org_id: &str, status: WoStatus) -> String {
        let now = Utc::now().naive_utc();
        let wo_id = Uuid::new_v4().to_string();
        let repo = WorkOrderRepository::new(self.conn.clone());
        repo.insert(&WorkOrder {
            wo_id: wo_id.clone(),
            org_id: org_id.to_string(),
            wo_number: format!("WO-{}", &wo_id[..8]),
            product_id: "prod-bread".to_string(),
            status,
            pause_reason: None,
            paused_at: None,
            paused_by: None,
            started_at: None,
            completed_at: None,
            created_by: ACTOR.to_string(),
            created_at: now,
            updated_at: now,
        })
        .expect("插入工单");
        wo_id
    }

    /// 造物料行
    pub fn seed_material(&self, wo_id: &str, required_qty: f64, whole_lp: bool) -> String {
        let material_id = Uuid::new_v4().to_string();
        let repo = WoMaterialRepository::new(self.conn.clone());
        repo.insert(&WorkOrderMaterial {
            material_id: material_id.clone(),
            org_id: ORG.to_string(),
            wo_id: wo_id.to_string(),
            product_id: PRODUCT.to_string(),
            material_name: "高筋面粉".to_string(),
            required_qty,
            consumed_qty: 0.0,
            reserved_qty: 0.0,
            uom: "kg".to_string(),
            consume_whole_lp: whole_lp,
        })
        .expect("插入物料行");
        material_id
    }

    /// 造可用容器 (附带入库台账)
    pub fn seed_lp(&self, quantity: f64) -> String {
        self.seed_lp_with(PRODUCT, "kg", quantity)
    }

    pub fn seed_lp_with(&self, product_id: &str, uom: &str, quantity: f64) -> String {
        let lp_id = Uuid::new_v4().to_string();
        let repo = LicensePlateRepository::new(self.conn.clone());
        repo.insert_with_receipt(
            &LicensePlate {
                lp_id: lp_id.clone(),
                org_id: ORG.to_string(),
                lp_number: format!("LP-{}", &lp_id[..8]),
                product_id: product_id.to_string(),
                quantity,
                uom: uom.to_string(),
                status: LpStatus::Available,
                qa_status: "passed".to_string(),
                parent_lp_id: None,
                consumed_by_wo_id: None,
                consumed_at: None,
                created_at: Utc::now().naive_utc(),
            },
            ACTOR,
        )
        .expect("插入容器");
        lp_id
    }

    /// 造工序
    pub fn seed_operation(&self, wo_id: &str, seq_no: i32, status: OperationStatus) -> String {
        let operation_id = Uuid::new_v4().to_string();
        let repo = WoOperationRepository::new(self.conn.clone());
        repo.insert(&WoOperation {
            operation_id: operation_id.clone(),
            org_id: ORG.to_string(),
            wo_id: wo_id.to_string(),
            seq_no,
            name: format!("工序{seq_no}"),
            status,
        })
        .expect("插入工序");
        operation_id
    }

    /// 查容器当前状态
    pub fn lp(&self, lp_id: &str) -> LicensePlate {
        LicensePlateRepository::new(self.conn.clone())
            .find_by_id(ORG, lp_id)
            .expect("查询容器")
            .expect("容器存在")
    }

    /// 查物料行当前状态
    pub fn material(&self, material_id: &str) -> WorkOrderMaterial {
        WoMaterialRepository::new(self.conn.clone())
            .find_by_id(ORG, material_id)
            .expect("查询物料行")
            .expect("物料行存在")
    }

    /// 查工单当前状态
    pub fn work_order(&self, wo_id: &str) -> WorkOrder {
        WorkOrderRepository::new(self.conn.clone())
            .find_by_id(ORG, wo_id)
            .expect("查询工单")
            .expect("工单存在")
    }

    /// 一套打通的 "执行中工单 + 物料行 + 容器 + 预留"
    pub fn seed_running_scenario(
        &self,
        required_qty: f64,
        lp_qty: f64,
        reserve_qty: f64,
        whole_lp: bool,
    ) -> RunningScenario {
        let wo_id = self.seed_work_order(WoStatus::Released);
        let material_id = self.seed_material(&wo_id, required_qty, whole_lp);
        let lp_id = self.seed_lp(lp_qty);
        let reservation = self
            .api
            .reserve_material(&self.ctx, &material_id, &lp_id, reserve_qty)
            .expect("预留");
        self.api
            .start_work_order(&self.ctx, &wo_id)
            .expect("开工");
        RunningScenario {
            wo_id,
            material_id,
            lp_id,
            reservation_id: reservation.reservation_id,
        }
    }
}

pub struct RunningScenario {
    pub wo_id: String,
    pub material_id: String,
    pub lp_id: String,
    pub reservation_id: String,
}
