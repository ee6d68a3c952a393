//! Catalog, cart, address, and card commands.

use clap::Subcommand;

use clementine_core::{AddressDraft, AddressId, CardDraft, CardId, ProductId};

use clementine_client::CommerceClient;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart contents and total
    Show,
    /// Add a product to the cart
    Add {
        /// Product ID
        #[arg(long)]
        product: i64,

        /// Quantity to add
        #[arg(long, default_value = "1")]
        quantity: u32,
    },
    /// Set a line's quantity (0 removes it)
    Update {
        /// Product ID
        #[arg(long)]
        product: i64,

        /// New quantity
        #[arg(long)]
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove {
        /// Product ID
        #[arg(long)]
        product: i64,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
pub enum AddressAction {
    /// List saved addresses
    List,
    /// Save a new address
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        address_line: String,
        #[arg(long)]
        city: String,
        #[arg(long)]
        district: String,
        #[arg(long)]
        postal_code: String,
        #[arg(long)]
        country: String,
        /// Make this the default address
        #[arg(long)]
        default: bool,
    },
    /// Make an address the default
    SetDefault {
        #[arg(long)]
        id: String,
    },
    /// Delete an address
    Remove {
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand)]
pub enum CardAction {
    /// List saved cards
    List,
    /// Save a new card
    Add {
        #[arg(long)]
        holder: String,
        #[arg(long)]
        number: String,
        #[arg(long)]
        expiry_month: String,
        #[arg(long)]
        expiry_year: String,
        #[arg(long)]
        cvv: String,
        /// Make this the default card
        #[arg(long)]
        default: bool,
    },
    /// Make a card the default
    SetDefault {
        #[arg(long)]
        id: String,
    },
    /// Delete a card
    Remove {
        #[arg(long)]
        id: String,
    },
}

/// List products, or show one.
pub async fn products(client: &CommerceClient, id: Option<i64>) -> CommandResult {
    if let Some(id) = id {
        let product = client.catalog().product(ProductId::new(id)).await?;
        println!("{} - {} ({} in stock)", product.id, product.name, product.stock);
        println!("  price: {}", product.price);
        if let Some(description) = &product.description {
            println!("  {description}");
        }
        return Ok(());
    }

    for product in client.catalog().products().await? {
        println!("{}\t{}\t{}", product.id, product.price, product.name);
    }
    Ok(())
}

/// Cart subcommands. The CLI is stateless between invocations, so every
/// action starts from the server's view of the cart.
pub async fn cart(client: &CommerceClient, action: CartAction) -> CommandResult {
    client.cart().fetch().await?;

    match action {
        CartAction::Show => {}
        CartAction::Add { product, quantity } => {
            let product = client.catalog().product(ProductId::new(product)).await?;
            client.cart().add(&product, quantity).await?;
        }
        CartAction::Update { product, quantity } => {
            client
                .cart()
                .update_quantity(ProductId::new(product), quantity)
                .await?;
        }
        CartAction::Remove { product } => {
            client.cart().remove(ProductId::new(product)).await?;
        }
        CartAction::Clear => client.cart().clear().await?,
    }

    let items = client.cart().items();
    if items.is_empty() {
        println!("Cart is empty");
    } else {
        for item in &items {
            println!(
                "{}\tx{}\t{}\t{}",
                item.product_id,
                item.quantity,
                item.unit_price,
                item.name
            );
        }
        println!("total: {}", client.cart().total());
    }
    Ok(())
}

/// Address subcommands.
pub async fn address(client: &CommerceClient, action: AddressAction) -> CommandResult {
    client.addresses().fetch().await?;

    match action {
        AddressAction::List => {}
        AddressAction::Add {
            title,
            first_name,
            last_name,
            address_line,
            city,
            district,
            postal_code,
            country,
            default,
        } => {
            let created = client
                .addresses()
                .add(AddressDraft {
                    title,
                    first_name,
                    last_name,
                    company: None,
                    address_line,
                    address_line_2: None,
                    city,
                    district,
                    postal_code,
                    country,
                    phone_number: None,
                    is_default: default,
                })
                .await?;
            println!("Saved address {}", created.id);
        }
        AddressAction::SetDefault { id } => {
            client.addresses().set_default(&AddressId::new(id)).await?;
        }
        AddressAction::Remove { id } => {
            client.addresses().remove(&AddressId::new(id)).await?;
        }
    }

    for address in client.addresses().addresses() {
        let marker = if address.is_default { "*" } else { " " };
        println!(
            "{marker} {}\t{}\t{}, {}",
            address.id, address.title, address.city, address.country
        );
    }
    Ok(())
}

/// Card subcommands.
pub async fn card(client: &CommerceClient, action: CardAction) -> CommandResult {
    client.cards().fetch().await?;

    match action {
        CardAction::List => {}
        CardAction::Add {
            holder,
            number,
            expiry_month,
            expiry_year,
            cvv,
            default,
        } => {
            let created = client
                .cards()
                .add(CardDraft {
                    card_holder_name: holder,
                    card_number: number,
                    expiry_month,
                    expiry_year,
                    cvv,
                    brand: None,
                    is_default: default,
                })
                .await?;
            println!("Saved card {}", created.id);
        }
        CardAction::SetDefault { id } => {
            client.cards().set_default(&CardId::new(id)).await?;
        }
        CardAction::Remove { id } => {
            client.cards().remove(&CardId::new(id)).await?;
        }
    }

    for card in client.cards().cards() {
        let marker = if card.is_default { "*" } else { " " };
        println!(
            "{marker} {}\t{}\t{}/{}",
            card.id, card.card_number, card.expiry_month, card.expiry_year
        );
    }
    Ok(())
}
