use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

use crate::player::worker::PlayerCommand;

/// Lanza el loop de progreso de una reproducción concreta. Se crea
/// exactamente uno por cada `play` exitoso; en cada tick el worker le
/// responde si debe seguir vivo, así que un loop de una generación anterior
/// muere en su primer tick después del cambio de pista.
///
/// El loop no toca estado del guild: leer y publicar ocurren dentro del
/// worker, bajo su misma serialización.
pub(crate) fn spawn_reporter(
    tx: mpsc::UnboundedSender<PlayerCommand>,
    generation: u64,
    period: Duration,
) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(period).await;
            let (reply, rx) = oneshot::channel();
            if tx
                .send(PlayerCommand::ProgressTick { generation, reply })
                .is_err()
            {
                break;
            }
            match rx.await {
                Ok(true) => {}
                _ => break,
            }
        }
    });
}
