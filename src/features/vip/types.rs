use crate::shared::api::lenient_number;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type PlanId = i64;

/// A purchasable plan from the catalog.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Plan {
    pub id: PlanId,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub precio: Option<f64>,
    #[serde(default)]
    pub limite_tareas: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub ganancia_diaria: Option<f64>,
}

/// `/api/vip/plans` answers either a bare list or `{ "planes": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum PlanList {
    Bare(Vec<Plan>),
    Wrapped {
        #[serde(default, alias = "plans")]
        planes: Vec<Plan>,
    },
}

impl PlanList {
    pub(crate) fn into_plans(self) -> Vec<Plan> {
        let mut plans = match self {
            Self::Bare(plans) | Self::Wrapped { planes: plans } => plans,
        };
        plans.sort_by_key(|plan| plan.id);
        plans
    }
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct PlanRequest {
    pub plan_id: PlanId,
}

/// `/api/vip/current`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct VipCurrent {
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub plan: Option<Value>,
}

/// `/api/suscripcion/mi-plan`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct MyPlan {
    #[serde(default)]
    pub plan_activo: Option<bool>,
    #[serde(default)]
    pub plan_id: Option<PlanId>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub limite_tareas: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub ganancia_diaria: Option<f64>,
    #[serde(default)]
    pub expira_en: Option<String>,
}

impl MyPlan {
    pub fn is_active(&self) -> bool {
        self.plan_activo == Some(true) || self.plan_id.is_some()
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct PlanSubscription {
    #[serde(default)]
    pub subscription_id: Option<Value>,
    #[serde(default)]
    pub plan_id: Option<PlanId>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub limite_tareas: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub ganancia_diaria: Option<f64>,
    #[serde(default)]
    pub expira_en: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `/api/suscripcion/mis-planes`.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct MyPlans {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub planes: Vec<PlanSubscription>,
}

impl From<MyPlan> for MyPlans {
    fn from(plan: MyPlan) -> Self {
        let planes = if plan.plan_activo == Some(true) {
            vec![PlanSubscription {
                subscription_id: None,
                plan_id: plan.plan_id,
                nombre: plan.nombre,
                limite_tareas: plan.limite_tareas,
                ganancia_diaria: plan.ganancia_diaria,
                expira_en: plan.expira_en,
                created_at: None,
            }]
        } else {
            Vec::new()
        };
        Self { ok: true, planes }
    }
}

/// What the VIP screen shows. A missing plan is a normal state, not an error.
#[derive(Clone, Debug, PartialEq)]
pub enum VipState {
    Active(VipCurrent),
    NoActivePlan,
    Failed(String),
}
