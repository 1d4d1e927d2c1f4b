// grocer/src/checkout/pipeline.rs
use crate::checkout::{final_total, CheckoutCtxData};
use crate::credits::credits_value;
use crate::error::{BackendError, CheckoutError};
use crate::flow::{Pipeline, Shared, SkipCondition, StepControl};
use crate::order::{NewDeliveryAddress, NewOrder, NewOrderItem, OrderMetadata, OrderStatus};
use std::sync::Arc;
use tracing::{info, warn};

/// Step names of the checkout pipeline, in execution order.
pub mod steps {
  pub const VALIDATE: &str = "validate_checkout";
  pub const REDEEM_CREDITS: &str = "redeem_credits";
  pub const COLLECT_PAYMENT: &str = "collect_payment";
  pub const SAVE_ADDRESS: &str = "save_delivery_address";
  pub const PERSIST_ORDER: &str = "persist_order";
  pub const PERSIST_ITEMS: &str = "persist_order_items";
  pub const CLEAR_CART: &str = "clear_cart";
}

const METADATA_COLUMN: &str = "metadata";

fn skip_without_credits() -> SkipCondition<CheckoutCtxData> {
  Arc::new(|ctx: &Shared<CheckoutCtxData>| ctx.read().options.credits_to_use == 0)
}

fn skip_cash_on_delivery() -> SkipCondition<CheckoutCtxData> {
  Arc::new(|ctx: &Shared<CheckoutCtxData>| !ctx.read().options.payment_method.needs_gateway())
}

fn skip_unless_saving_address() -> SkipCondition<CheckoutCtxData> {
  Arc::new(|ctx: &Shared<CheckoutCtxData>| !ctx.read().options.needs_address_insert())
}

pub fn build_checkout_pipeline() -> Pipeline<CheckoutCtxData, CheckoutError> {
  let mut p = Pipeline::<CheckoutCtxData, CheckoutError>::new(&[
    (steps::VALIDATE, false, None),
    (steps::REDEEM_CREDITS, false, Some(skip_without_credits())),
    (steps::COLLECT_PAYMENT, false, Some(skip_cash_on_delivery())),
    (steps::SAVE_ADDRESS, false, Some(skip_unless_saving_address())),
    (steps::PERSIST_ORDER, false, None),
    (steps::PERSIST_ITEMS, false, None),
    (steps::CLEAR_CART, false, None),
  ]);

  // Step 1: Validate. No side effects.
  p.on_step(steps::VALIDATE, |ctx: Shared<CheckoutCtxData>| {
    Box::pin(async move {
      let auth = {
        let guard = ctx.read();
        let address = &guard.options.address;
        if address.house.trim().is_empty() || address.phone.trim().is_empty() {
          warn!("Checkout rejected: delivery address line or phone missing.");
          return Err(CheckoutError::Validation(
            "Please enter your house/street and phone number before checkout.".to_string(),
          ));
        }
        guard.auth.clone()
      };

      let user_id = auth.current_user().await.ok_or(CheckoutError::Unauthenticated)?;

      let mut guard = ctx.write();
      let (lines, subtotal) = {
        let cart = guard.cart.read();
        (cart.items().to_vec(), cart.total_price())
      };
      if lines.is_empty() {
        return Err(CheckoutError::Validation("Cart is empty".to_string()));
      }

      let requested = guard.options.credits_to_use;
      let cap = guard.ledger.read().max_redeemable(subtotal);
      if requested > cap {
        warn!(requested, cap, "Checkout rejected: credits exceed the redemption cap.");
        return Err(CheckoutError::Credits {
          requested,
          available: cap,
        });
      }

      let discount = credits_value(requested);
      guard.user_id = Some(user_id);
      guard.lines = lines;
      guard.subtotal = subtotal;
      guard.discount = discount;
      guard.final_total = final_total(subtotal, discount);
      guard.delivery_address_id = guard.options.saved_address_id;
      info!(
        %user_id,
        subtotal,
        discount,
        final_total = guard.final_total,
        "Checkout validated."
      );
      Ok(StepControl::Continue)
    })
  });

  // Step 2: Redeem credits. Refunded if anything later fails.
  p.on_step(steps::REDEEM_CREDITS, |ctx: Shared<CheckoutCtxData>| {
    Box::pin(async move {
      let (ledger, amount) = {
        let guard = ctx.read();
        (guard.ledger.clone(), guard.options.credits_to_use)
      };
      let redeemed = ledger.write().redeem_credits(amount);
      if !redeemed {
        let available = ledger.read().balance();
        return Err(CheckoutError::Credits {
          requested: amount,
          available,
        });
      }
      ctx.write().credits_redeemed = amount;
      Ok(StepControl::Continue)
    })
  });
  p.compensate_step(steps::REDEEM_CREDITS, |ctx: Shared<CheckoutCtxData>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      let amount = std::mem::take(&mut guard.credits_redeemed);
      guard.ledger.write().refund_redemption(amount, "checkout did not complete");
      Ok::<_, CheckoutError>(())
    })
  });

  // Step 3: Collect payment through the gateway (skipped for cash on delivery).
  p.on_step(steps::COLLECT_PAYMENT, |ctx: Shared<CheckoutCtxData>| {
    Box::pin(async move {
      let (gateway, method, amount) = {
        let guard = ctx.read();
        (guard.gateway.clone(), guard.options.payment_method, guard.final_total)
      };
      info!(%method, amount, "Awaiting payment gateway.");
      let receipt = gateway.charge(method, amount).await;
      if !receipt.success {
        warn!(%method, "Payment gateway reported a failure.");
        return Err(CheckoutError::Payment("Payment gateway reported a failure.".to_string()));
      }
      ctx.write().payment_reference = receipt.reference;
      Ok(StepControl::Continue)
    })
  });

  // Step 4: Save a new delivery address. Not undone on later failure.
  p.on_step(steps::SAVE_ADDRESS, |ctx: Shared<CheckoutCtxData>| {
    Box::pin(async move {
      let (backend, new_address) = {
        let guard = ctx.read();
        let user_id = guard.user_id.ok_or(CheckoutError::Unauthenticated)?;
        (
          guard.backend.clone(),
          NewDeliveryAddress::from_input(user_id, &guard.options.address),
        )
      };
      let saved = backend
        .insert_delivery_address(new_address)
        .await
        .map_err(CheckoutError::AddressSave)?;
      info!(address_id = %saved.id, "Delivery address saved.");
      ctx.write().delivery_address_id = Some(saved.id);
      Ok::<_, CheckoutError>(StepControl::Continue)
    })
  });

  // Step 5: Persist the order row, falling back to a payload without
  // metadata when the schema has no such column.
  p.on_step(steps::PERSIST_ORDER, |ctx: Shared<CheckoutCtxData>| {
    Box::pin(async move {
      let (backend, schema, order) = {
        let guard = ctx.read();
        let user_id = guard.user_id.ok_or(CheckoutError::Unauthenticated)?;
        let metadata = OrderMetadata {
          address: Some(guard.options.address.clone()),
          payment_method: Some(guard.options.payment_method),
          payment_reference: guard.payment_reference.clone(),
          credits_used: (guard.credits_redeemed > 0).then_some(guard.credits_redeemed),
        };
        let order = NewOrder {
          user_id,
          total_amount: guard.final_total,
          status: OrderStatus::Placed,
          delivery_address_id: guard.delivery_address_id,
          metadata: (!metadata.is_empty()).then_some(metadata),
        };
        (guard.backend.clone(), guard.schema.clone(), order)
      };

      let inserted = if order.metadata.is_some() && schema.order_metadata() {
        match backend.insert_order(order.clone()).await {
          Err(BackendError::UnknownColumn { table, column }) if column == METADATA_COLUMN => {
            warn!(%table, %column, "Order metadata not supported by schema; retrying without it.");
            schema.disable_order_metadata();
            backend.insert_order(order.without_metadata()).await
          }
          other => other,
        }
      } else {
        backend.insert_order(order.without_metadata()).await
      };
      let created = inserted.map_err(CheckoutError::OrderInsert)?;

      info!(order_id = %created.id, total = created.total_amount, "Order created.");
      ctx.write().order_id = Some(created.id);
      Ok::<_, CheckoutError>(StepControl::Continue)
    })
  });
  p.compensate_step(steps::PERSIST_ORDER, |ctx: Shared<CheckoutCtxData>| {
    Box::pin(async move {
      let (backend, order_id) = {
        let guard = ctx.read();
        (guard.backend.clone(), guard.order_id)
      };
      let Some(order_id) = order_id else {
        return Ok(());
      };
      warn!(%order_id, "Rolling back order.");
      backend
        .delete_order(order_id)
        .await
        .map_err(|source| CheckoutError::Rollback { order_id, source })?;
      ctx.write().order_id = None;
      Ok::<_, CheckoutError>(())
    })
  });

  // Step 6: Persist one item per cart line, unit price copied from the
  // product's effective price.
  p.on_step(steps::PERSIST_ITEMS, |ctx: Shared<CheckoutCtxData>| {
    Box::pin(async move {
      let (backend, items) = {
        let guard = ctx.read();
        let order_id = guard
          .order_id
          .ok_or_else(|| CheckoutError::Validation("Order was not created".to_string()))?;
        let items: Vec<NewOrderItem> = guard
          .lines
          .iter()
          .map(|line| NewOrderItem {
            order_id,
            product_id: line.product.id,
            quantity: line.quantity,
            price: line.product.effective_price(),
          })
          .collect();
        (guard.backend.clone(), items)
      };
      let count = items.len();
      backend
        .insert_order_items(items)
        .await
        .map_err(CheckoutError::OrderItemsInsert)?;
      info!(count, "Order items saved.");
      ctx.write().order_items_saved = true;
      Ok::<_, CheckoutError>(StepControl::Continue)
    })
  });

  // Step 7: Clear the cart.
  p.on_step(steps::CLEAR_CART, |ctx: Shared<CheckoutCtxData>| {
    Box::pin(async move {
      let cart = { ctx.read().cart.clone() };
      cart.write().clear();
      Ok::<_, CheckoutError>(StepControl::Continue)
    })
  });

  p
}
