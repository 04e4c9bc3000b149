use log::{debug, error};
use tokio::sync::watch;

#[cfg(windows)]
pub async fn wait_shutdown() {
    match tokio::signal::ctrl_c().await {
        Ok(_) => {
            debug!("recv ctrl_c, shutdown")
        }
        Err(e) => {
            debug!("error, ctrl_c, {:?}", e);
        }
    }
}

#[cfg(unix)]
pub async fn wait_shutdown() {
    use tokio::signal::unix::SignalKind;
    async fn terminate() -> std::io::Result<()> {
        let mut signal = tokio::signal::unix::signal(SignalKind::terminate())?;
        let _ = signal.recv().await;
        Ok(())
    }

    tokio::select! {
        s = terminate() => {
            debug!("recv unix terminate signal, {:?}", s);
        },
        s = tokio::signal::ctrl_c() => {
            debug!("recv unix ctrl_c signal, {:?}", s);
        }
    }
}

// 需要在 tokio runtime 内调用
pub fn shutdown_channel() -> watch::Receiver<u8> {
    let (signal_tx, signal_rx) = watch::channel(0_u8);

    tokio::spawn(async move {
        wait_shutdown().await;
        if let Err(e) = signal_tx.send(1) {
            error!("error, {:?}", e);
        }
    });

    signal_rx
}
