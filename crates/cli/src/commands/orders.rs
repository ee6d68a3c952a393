//! Checkout and order commands.

use clap::Subcommand;

use clementine_core::{AddressId, CardId, OrderId};

use clementine_client::CommerceClient;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Subcommand)]
pub enum OrdersAction {
    /// List the user's orders
    List,
    /// Cancel a pending order
    Cancel {
        /// Order ID
        #[arg(long)]
        id: String,
    },
}

/// Place an order from the current cart.
pub async fn checkout(
    client: &CommerceClient,
    address: &str,
    card: &str,
    notes: Option<String>,
) -> CommandResult {
    client.cart().fetch().await?;

    let order = client
        .checkout()
        .place_order(AddressId::new(address), CardId::new(card), notes)
        .await?;

    println!(
        "Order {} placed ({}): {}",
        order.order_number.as_deref().unwrap_or(order.id.as_str()),
        order.status,
        order.total_amount
    );
    Ok(())
}

/// Order subcommands.
pub async fn orders(client: &CommerceClient, action: OrdersAction) -> CommandResult {
    client.orders().fetch().await?;

    if let OrdersAction::Cancel { id } = action {
        let id = OrderId::new(id);
        client.orders().cancel(&id).await?;
        println!("Cancelled order {id}");
    }

    for order in client.orders().orders() {
        println!(
            "{}\t{}\t{}\t{}",
            order.id,
            order.status,
            order.total_amount,
            order
                .created_at
                .map_or_else(String::new, |t| t.format("%Y-%m-%d %H:%M").to_string())
        );
    }
    Ok(())
}
