use atende_test_context::{
    call::{self, CallService},
    AtendeContext,
};

pub async fn caller(ctx: &AtendeContext) -> anyhow::Result<impl CallService + '_> {
    call::caller(|svc| crate::endpoints::configure(svc, ctx.db.clone())).await
}
