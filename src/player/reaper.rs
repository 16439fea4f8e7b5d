use std::sync::Arc;

use crate::player::PlaybackEngine;

/// Escáner pasivo de inactividad. Cada período envía un tick a cada worker
/// de guild; la contabilidad y la eventual desconexión ocurren dentro de la
/// serialización del worker, nunca acá.
pub(crate) fn spawn(engine: Arc<PlaybackEngine>) {
    tokio::spawn(async move {
        let period = engine.settings().idle_check_period;
        let mut interval = tokio::time::interval(period);
        // El primer tick de interval es inmediato; no cuenta como espera.
        interval.tick().await;
        loop {
            interval.tick().await;
            engine.broadcast_idle_tick(period);
        }
    });
}
